//! Error types for simulation setup.
//!
//! Ticking never fails; errors only come from building entities or loading
//! configuration.

use thiserror::Error;

use crate::sim::EntityId;

/// Result type alias for simulation setup operations.
pub type SimResult<T> = Result<T, SimError>;

/// Errors raised while constructing entities or loading settings.
#[derive(Debug, Error)]
pub enum SimError {
    /// A stat block field is outside its allowed range.
    #[error("invalid stat `{field}`: {value}")]
    InvalidStat { field: &'static str, value: f32 },

    /// An entity id referenced by a caller is not in the active set.
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    /// Settings are internally inconsistent.
    #[error("invalid settings: {0}")]
    Config(String),

    /// Settings file could not be read.
    #[error("failed to read settings: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// Settings file is not valid JSON for `Settings`.
    #[error("failed to parse settings: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl SimError {
    /// Create an invalid stat error.
    #[must_use]
    pub const fn invalid_stat(field: &'static str, value: f32) -> Self {
        Self::InvalidStat { field, value }
    }

    /// Create a settings consistency error.
    #[must_use]
    pub fn config(details: impl Into<String>) -> Self {
        Self::Config(details.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimError::invalid_stat("mass", 0.0);
        assert!(format!("{err}").contains("mass"));

        let err = SimError::config("arena too small");
        assert!(format!("{err}").contains("arena too small"));

        let err = SimError::UnknownEntity(EntityId(7));
        assert!(format!("{err}").contains('7'));
    }
}
