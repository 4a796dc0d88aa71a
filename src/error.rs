use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unable to read settings: {0}")]
    Config(#[from] config::ConfigError),

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
