pub mod config;
pub mod errors;
pub mod export;
pub mod formula_types;
pub mod slip;
pub mod units;

pub mod app_context;
pub use app_context::AppContext;
pub mod database;
pub mod services;
