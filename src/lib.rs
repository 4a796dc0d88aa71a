use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

pub mod codec;
pub mod delivery_log;
pub mod email;
pub mod error;
pub mod factory;
pub mod maintenance;
pub mod queue;
pub mod settings;
pub mod suppression;

pub use delivery_log::{DeliveryLog, LoggedMessage};
pub use email::{Attachment, Email, Headers};
pub use entity::{priority::Priority, result_code::ResultCode};
pub use error::{Error, Result};
pub use factory::{make_message, NewEmail, PendingMessage};
pub use queue::{Queue, QueuedMessage};
pub use settings::Settings;
pub use suppression::SuppressionList;

/// Opens the database and brings the schema up to date.
pub async fn connect(db_url: &str) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(db_url.to_owned());
    if db_url.contains(":memory:") {
        // Every pooled connection would otherwise get its own empty database.
        options.max_connections(1);
    }
    options.sqlx_logging(false);

    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;
    info!("connected to database");

    Ok(db)
}

pub async fn real_main(config_file: Option<String>) -> Result<()> {
    let settings = match config_file {
        Some(path) => Settings::from_file(&path)?,
        None => Settings::new()?,
    };

    tracing_subscriber::fmt()
        .with_max_level(settings.get_log_level())
        .init();

    let db = connect(&settings.get_db_url()).await?;
    let report = maintenance::run(&settings, &db).await?;
    info!("maintenance finished: {:?}", report);

    Ok(())
}
