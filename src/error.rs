//! Error types for benchmark sessions.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by a benchmark session.
#[derive(Error, Debug)]
pub enum BenchError {
    /// The scratch directory could not be cleared or created.
    #[error("failed to prepare scratch directory {path}: {source}")]
    Setup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A workload hit an I/O error mid-measurement.
    #[error("workload {test} failed: {source}")]
    Workload {
        test: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The report could not be written or read.
    #[error("failed to persist report {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("report serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl BenchError {
    pub(crate) fn workload(test: impl Into<String>, source: io::Error) -> Self {
        Self::Workload {
            test: test.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_name_workload_when_displayed() {
        let err = BenchError::workload(
            "rand_write_1048576",
            io::Error::new(io::ErrorKind::Other, "disk full"),
        );
        let msg = err.to_string();
        assert!(msg.contains("rand_write_1048576"));
        assert!(msg.contains("disk full"));
    }
}
