pub mod authorization;
pub mod formula_service;
pub mod grade_resolver;
pub mod party_locks;
pub mod party_service;
pub mod validation;

pub use authorization::{AdminAction, AdminAuthorizer, AllowAll, DenyAll, PasswordAuthorizer};
pub use formula_service::FormulaService;
pub use grade_resolver::{GradeResolution, GradeResolver};
pub use party_locks::{PartyLocks, WriteGuard};
pub use party_service::{CascadeReport, CascadeStep, PartyService};
pub use validation::ValidationService;
