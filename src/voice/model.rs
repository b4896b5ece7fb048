//! Speech model bookkeeping
//!
//! Loading and running the model happens outside the engine. The engine only
//! tracks which model is active and checks that an uploaded bundle has the
//! files the recognizer needs.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Files an uploaded model bundle must contain
pub const REQUIRED_BUNDLE_FILES: [&str; 2] = ["model.json", "metadata.json"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelSource {
    /// Model shipped with the game
    Default,
    /// User-supplied archive
    Uploaded { name: String },
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSource::Default => f.write_str("default model"),
            ModelSource::Uploaded { name } => write!(f, "uploaded model `{}`", name),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelStatus {
    #[default]
    NotLoaded,
    Loading(ModelSource),
    Ready(ModelSource),
}

impl ModelStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, ModelStatus::Ready(_))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("model bundle must include {0}")]
    MissingFile(&'static str),
}

/// Check an uploaded bundle's file list (entries may sit in subfolders)
pub fn validate_bundle<'a, I>(entries: I) -> Result<(), ModelError>
where
    I: IntoIterator<Item = &'a str>,
{
    let names: Vec<&str> = entries
        .into_iter()
        .map(|e| e.rsplit('/').next().unwrap_or(e))
        .collect();
    for required in REQUIRED_BUNDLE_FILES {
        if !names.contains(&required) {
            return Err(ModelError::MissingFile(required));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_bundle() {
        assert!(validate_bundle(["model.json", "metadata.json", "weights.bin"]).is_ok());
        assert!(validate_bundle(["export/model.json", "export/metadata.json"]).is_ok());
    }

    #[test]
    fn test_missing_metadata() {
        assert_eq!(
            validate_bundle(["model.json", "weights.bin"]),
            Err(ModelError::MissingFile("metadata.json"))
        );
    }

    #[test]
    fn test_empty_bundle() {
        assert_eq!(
            validate_bundle(std::iter::empty()),
            Err(ModelError::MissingFile("model.json"))
        );
    }

    #[test]
    fn test_status_ready() {
        assert!(!ModelStatus::default().is_ready());
        assert!(!ModelStatus::Loading(ModelSource::Default).is_ready());
        assert!(ModelStatus::Ready(ModelSource::Default).is_ready());
    }
}
