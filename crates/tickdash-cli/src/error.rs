use std::path::PathBuf;

use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Transform(#[from] tickdash_core::TransformError),

    #[error(transparent)]
    Fetch(#[from] tickdash_core::FetchError),

    #[error(transparent)]
    Load(#[from] tickdash_core::LoadError),

    #[error(transparent)]
    Warehouse(#[from] tickdash_core::WarehouseError),

    #[error("store '{}' does not exist; run `tickdash etl` first", path.display())]
    StoreNotFound { path: PathBuf },

    #[error(transparent)]
    Server(#[from] tickdash_web::ServerError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Transform(_) => 2,
            Self::Fetch(_) => 3,
            Self::Load(_) => 4,
            Self::Warehouse(_) | Self::StoreNotFound { .. } => 4,
            Self::Serialization(_) => 5,
            Self::Server(_) => 6,
            Self::Io(_) => 10,
        }
    }
}
