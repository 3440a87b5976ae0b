pub mod connection;
pub mod entities;
pub mod migrations;
pub mod seed_data;
pub mod test_utils;

pub use connection::*;

use anyhow::Result;
use sea_orm_migration::MigratorTrait;
use tracing::info;

use migrations::Migrator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MigrateDirection {
    Up,
    Down,
    Fresh,
}

pub async fn migrate_database(database_path: &str, direction: MigrateDirection) -> Result<()> {
    let database_url = get_database_url(Some(database_path));
    let db = establish_connection(&database_url).await?;

    match direction {
        MigrateDirection::Up => {
            Migrator::up(&db, None).await?;
            info!("Database migrations applied");
        }
        MigrateDirection::Down => {
            Migrator::down(&db, None).await?;
            info!("Database migrations rolled back");
        }
        MigrateDirection::Fresh => {
            Migrator::fresh(&db).await?;
            info!("Database recreated from scratch");
        }
    }

    Ok(())
}
