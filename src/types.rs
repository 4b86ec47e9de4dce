// (C) Coralbits SL 2025
// This file is part of Pgcache and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Connection failed: {0}")]
    Connection(#[source] sqlx::Error),
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },
    #[error("Serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),
    #[error("Query failed: {0}")]
    Query(#[from] sqlx::Error),
}

impl CacheError {
    pub fn error_code(&self) -> &'static str {
        match self {
            CacheError::Connection(..) => "CONNECTION_FAILED",
            CacheError::Configuration { .. } => "INVALID_CONFIGURATION",
            CacheError::Serialization(..) => "SERIALIZATION_FAILED",
            CacheError::Query(..) => "QUERY_FAILED",
        }
    }
}
