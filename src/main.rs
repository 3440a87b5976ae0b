use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use slip_generator::config::AppConfig;
use slip_generator::database::seed_data::{apply_seed, SeedFile};
use slip_generator::database::{migrate_database, MigrateDirection};
use slip_generator::export::to_csv_slip;
use slip_generator::formula_types::{apply_edits, EntryDraft, FormulaEntry};
use slip_generator::services::{GradeResolution, PasswordAuthorizer};
use slip_generator::units::MassUnit;
use slip_generator::AppContext;

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Config file; missing files fall back to defaults
    #[clap(short, long, global = true, default_value = "slipgen.toml")]
    config: PathBuf,
    /// Database file, overrides the config file
    #[clap(short, long, global = true)]
    database: Option<String>,
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Db {
        #[clap(subcommand)]
        command: DbCommands,
    },
    /// Print a bcrypt hash for `admin_password_hash`
    HashPassword { password: String },
    #[clap(flatten)]
    Store(StoreCommands),
}

/// Commands that run against an opened formula database
#[derive(Subcommand)]
enum StoreCommands {
    Party {
        #[clap(subcommand)]
        command: PartyCommands,
    },
    Grade {
        #[clap(subcommand)]
        command: GradeCommands,
    },
    Formula {
        #[clap(subcommand)]
        command: FormulaCommands,
    },
    Custom {
        #[clap(subcommand)]
        command: CustomCommands,
    },
    /// Scale a grade to a target weight and print the slip
    Slip {
        #[clap(short, long)]
        party: String,
        #[clap(short, long)]
        grade: String,
        #[clap(short, long)]
        weight: f64,
        /// kg, g or mg; defaults to the configured display unit
        #[clap(short, long)]
        unit: Option<String>,
        /// One-off edit applied before scaling, e.g. "OB=12g"
        #[clap(long)]
        set: Vec<String>,
        /// Also write the slip as CSV
        #[clap(long)]
        csv: Option<PathBuf>,
    },
    /// Load base formulas from a YAML seed file
    Seed {
        #[clap(short, long)]
        file: Option<PathBuf>,
        /// Seed the bundled ABC / 250R formula
        #[clap(long)]
        sample: bool,
        #[clap(short, long)]
        password: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum DbCommands {
    Init,
    Migrate {
        #[clap(value_enum)]
        direction: MigrateDirection,
    },
}

#[derive(Subcommand)]
enum PartyCommands {
    List,
    Create {
        #[clap(short, long)]
        name: String,
        #[clap(short, long)]
        email: Option<String>,
        /// Initial base grade, requires at least one --entry
        #[clap(short, long)]
        grade: Option<String>,
        /// Formula entry, e.g. "Resin China=12.5kg"
        #[clap(long)]
        entry: Vec<String>,
        #[clap(short, long)]
        password: Option<String>,
    },
    Delete {
        #[clap(short, long)]
        name: Option<String>,
        #[clap(long)]
        id: Option<i32>,
        #[clap(short, long)]
        password: Option<String>,
        /// Confirm deletion of the party and all related data
        #[clap(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum GradeCommands {
    List {
        #[clap(short, long)]
        party: String,
    },
}

#[derive(Subcommand)]
enum FormulaCommands {
    Show {
        #[clap(short, long)]
        party: String,
        #[clap(short, long)]
        grade: String,
        #[clap(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum CustomCommands {
    /// Save an edited copy of a grade under a new name
    Save {
        #[clap(short, long)]
        party: String,
        #[clap(short, long)]
        base_grade: String,
        #[clap(short, long)]
        name: String,
        /// Edit applied to the base formula, e.g. "OB=12g"
        #[clap(long)]
        set: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let config = AppConfig::load(&args.config)?;
    setup_logging(args.log_level.as_ref().or(config.log_level.as_ref()));

    let database = args.database.clone().unwrap_or_else(|| config.database.clone());

    match args.command {
        Commands::HashPassword { password } => {
            println!("{}", PasswordAuthorizer::hash_password(&password)?);
        }
        Commands::Db { command } => match command {
            DbCommands::Init => {
                info!("Initializing database: {}", database);
                migrate_database(&database, MigrateDirection::Up).await?;
            }
            DbCommands::Migrate { direction } => {
                info!("Running database migration: {:?}", direction);
                migrate_database(&database, direction).await?;
            }
        },
        Commands::Store(command) => {
            let ctx = AppContext::open(&database).await?;
            run(&ctx, &config, command).await?;
        }
    }

    Ok(())
}

async fn run(ctx: &AppContext, config: &AppConfig, command: StoreCommands) -> Result<()> {
    match command {
        StoreCommands::Party { command } => match command {
            PartyCommands::List => {
                for party in ctx.list_parties().await? {
                    match party.email {
                        Some(email) => println!("{:>4}  {} <{}>", party.id, party.name, email),
                        None => println!("{:>4}  {}", party.id, party.name),
                    }
                }
            }
            PartyCommands::Create {
                name,
                email,
                grade,
                entry,
                password,
            } => {
                let authorizer = admin(config, password);
                let party = match grade {
                    Some(grade) => {
                        let entries = parse_entries(&entry)?;
                        ctx.create_party_with_formula(
                            &authorizer,
                            &name,
                            email.as_deref(),
                            &grade,
                            &entries,
                        )
                        .await?
                    }
                    None if !entry.is_empty() => bail!("--entry requires --grade"),
                    None => ctx.create_party(&authorizer, &name, email.as_deref()).await?,
                };
                println!("Created party '{}' with id {}", party.name, party.id);
            }
            PartyCommands::Delete {
                name,
                id,
                password,
                yes,
            } => {
                let party = match (id, name) {
                    (Some(id), _) => ctx
                        .party_service()
                        .get_party(id)
                        .await?
                        .with_context(|| format!("Party {} not found", id))?,
                    (None, Some(name)) => ctx.require_party_by_name(&name).await?,
                    (None, None) => bail!("Pass --name or --id"),
                };

                if !yes {
                    warn!(
                        "Not deleting '{}': pass --yes to confirm deletion of the party and all related data",
                        party.name
                    );
                    return Ok(());
                }

                let report = ctx.delete_party(&admin(config, password), party.id).await?;
                println!(
                    "Deleted party '{}' ({} formula rows, {} custom grades)",
                    party.name, report.formula_rows, report.custom_grades
                );
            }
        },
        StoreCommands::Grade {
            command: GradeCommands::List { party },
        } => {
            let party = ctx.require_party_by_name(&party).await?;
            for grade in ctx.list_grades(party.id).await? {
                println!("{}", grade);
            }
        }
        StoreCommands::Formula {
            command: FormulaCommands::Show { party, grade, json },
        } => {
            let party = ctx.require_party_by_name(&party).await?;
            let resolution = ctx.resolve_grade(party.id, &grade).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&resolution)?);
                return Ok(());
            }

            match &resolution {
                GradeResolution::Missing => {
                    warn!("No formula found for grade '{}'", grade);
                    return Ok(());
                }
                GradeResolution::Base { .. } => println!("Base grade '{}'", grade),
                GradeResolution::Custom { grade: custom, .. } => println!(
                    "Custom grade '{}' based on '{}' (created {})",
                    custom.grade_name, custom.based_on, custom.created_at
                ),
            }
            print_entries(resolution.entries());
        }
        StoreCommands::Custom {
            command:
                CustomCommands::Save {
                    party,
                    base_grade,
                    name,
                    set,
                },
        } => {
            let party = ctx.require_party_by_name(&party).await?;
            let base = ctx.resolve_formula(party.id, &base_grade).await?;
            if base.is_empty() {
                bail!("No formula found for grade '{}'", base_grade);
            }

            let entries = apply_edits(&base, &parse_entries(&set)?);
            let grade = ctx
                .save_custom_grade(party.id, &base_grade, &name, &entries)
                .await?;
            println!("Custom grade '{}' saved (id {})", grade.grade_name, grade.id);
        }
        StoreCommands::Slip {
            party,
            grade,
            weight,
            unit,
            set,
            csv,
        } => {
            let display_unit = match unit {
                Some(unit) => MassUnit::parse_label(&unit)?,
                None => config.default_display_unit,
            };

            let party = ctx.require_party_by_name(&party).await?;
            let slip = ctx
                .generate_slip(&party, &grade, &parse_entries(&set)?, weight, display_unit)
                .await?;
            print!("{}", slip.render_text());

            if let Some(path) = csv {
                let rendered = to_csv_slip::render(&slip)
                    .map_err(|e| anyhow::anyhow!("Failed to render slip CSV: {}", e))?;
                std::fs::write(&path, rendered)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Wrote slip CSV to {}", path.display());
            }
        }
        StoreCommands::Seed {
            file,
            sample,
            password,
        } => {
            let seed = match (file, sample) {
                (Some(path), _) => SeedFile::from_path(path)?,
                (None, true) => SeedFile::sample()?,
                (None, false) => bail!("Pass --file or --sample"),
            };
            let report = apply_seed(ctx, &admin(config, password), &seed).await?;
            println!(
                "Seeded party id {} ({} rows{})",
                report.party_id,
                report.rows_written,
                if report.party_created { ", party created" } else { "" }
            );
        }
    }

    Ok(())
}

fn admin(config: &AppConfig, password: Option<String>) -> PasswordAuthorizer {
    PasswordAuthorizer::new(config.admin_password_hash.clone(), password)
}

fn parse_entries(raw: &[String]) -> Result<Vec<FormulaEntry>> {
    raw.iter()
        .map(|s| -> Result<FormulaEntry> { Ok(s.parse::<EntryDraft>()?.validate()?) })
        .collect()
}

fn print_entries(entries: &[FormulaEntry]) {
    let width = entries
        .iter()
        .map(|e| e.compound.chars().count())
        .max()
        .unwrap_or(0)
        .max("Compound".len());

    println!("{:<width$}  {:>10}  Unit", "Compound", "Quantity", width = width);
    for entry in entries {
        println!(
            "{:<width$}  {:>10}  {}",
            entry.compound,
            entry.quantity,
            entry.unit,
            width = width
        );
    }
}

fn setup_logging(log_level: Option<&String>) {
    let log_level = match log_level
        .map(|level| level.to_lowercase())
        .as_deref()
        .unwrap_or("info")
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!(
            "sqlx=warn,sea_orm_migration=warn,{}",
            log_level
        )))
        .without_time()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_store_commands_are_routed_to_run() {
        let cli = Cli::try_parse_from([
            "slipgen", "slip", "-p", "ABC", "-g", "250R", "-w", "2", "--set", "OB=12g",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Store(StoreCommands::Slip { ref party, weight, .. }) if party == "ABC" && weight == 2.0
        ));

        let cli = Cli::try_parse_from(["slipgen", "party", "list"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Store(StoreCommands::Party {
                command: PartyCommands::List
            })
        ));
    }

    #[test]
    fn test_database_free_commands_stay_in_main() {
        let cli = Cli::try_parse_from(["slipgen", "hash-password", "correct horse"]).unwrap();
        assert!(matches!(cli.command, Commands::HashPassword { ref password } if password == "correct horse"));

        let cli = Cli::try_parse_from(["slipgen", "db", "migrate", "fresh"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Db {
                command: DbCommands::Migrate {
                    direction: MigrateDirection::Fresh
                }
            }
        ));
    }
}
