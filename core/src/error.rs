use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("No data for selection: {what}")]
    NoDataForSelection { what: String },

    #[error("Site '{site_id}' has no financial record")]
    MissingFinancials { site_id: String },

    #[error("Unknown page '{name}'")]
    UnknownPage { name: String },

    #[error("Page '{page}' requires login")]
    Unauthorized { page: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DashError {
    pub fn no_data(what: impl Into<String>) -> Self {
        Self::NoDataForSelection { what: what.into() }
    }
}

pub type DashResult<T> = Result<T, DashError>;
