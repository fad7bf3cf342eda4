use std::path::PathBuf;

use camp_api::ApiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Failed to write index {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize index: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{context}: {source}")]
    Remote {
        context: String,
        #[source]
        source: ApiError,
    },
}

impl IndexError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn remote(context: impl Into<String>, source: ApiError) -> Self {
        Self::Remote {
            context: context.into(),
            source,
        }
    }
}
