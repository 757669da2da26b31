use std::env;
use std::path::PathBuf;

use crate::error::{RawlineError, Result};

pub const PIECES_COLLECTION: &str = "pieces";
pub const SETTINGS_COLLECTION: &str = "settings";
pub const CONTENT_DOC_ID: &str = "main_content";

pub const FIRESTORE_BASE: &str = "https://firestore.googleapis.com/v1";
pub const IDENTITY_BASE: &str = "https://identitytoolkit.googleapis.com/v1";
pub const CLOUDINARY_BASE: &str = "https://api.cloudinary.com/v1_1";
pub const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const DEFAULT_UPLOAD_PRESET: &str = "real_unsigned";
pub const DEFAULT_UPLOAD_FOLDER: &str = "rawline";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";

/// Width used for variant URLs when a caller does not ask for one.
pub const DEFAULT_VARIANT_WIDTH: u32 = 1200;

/// Page size used when listing the pieces collection.
pub const LIST_PAGE_SIZE: u32 = 300;

/// Deployment credentials for the hosted services.
///
/// Nothing here is compiled in: build one explicitly or read it from the
/// `RAWLINE_*` environment variables with [`RawlineConfig::from_env`].
#[derive(Debug, Clone, Default)]
pub struct RawlineConfig {
    pub firebase_project_id: String,
    pub firebase_api_key: String,
    pub cloudinary_cloud: String,
    pub cloudinary_preset: String,
    pub cloudinary_folder: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
}

impl RawlineConfig {
    pub fn new(
        firebase_project_id: impl Into<String>,
        firebase_api_key: impl Into<String>,
        cloudinary_cloud: impl Into<String>,
    ) -> Self {
        Self {
            firebase_project_id: firebase_project_id.into(),
            firebase_api_key: firebase_api_key.into(),
            cloudinary_cloud: cloudinary_cloud.into(),
            cloudinary_preset: DEFAULT_UPLOAD_PRESET.to_string(),
            cloudinary_folder: DEFAULT_UPLOAD_FOLDER.to_string(),
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
        }
    }

    pub fn with_gemini_key(mut self, key: impl Into<String>) -> Self {
        self.gemini_api_key = Some(key.into());
        self
    }

    /// Read the configuration from the process environment.
    ///
    /// Project id, web API key and cloud name are required; the rest fall
    /// back to the crate defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| {
                    RawlineError::InvalidArgument(format!("Missing environment variable {}", key))
                })
        };

        let mut config = Self::new(
            required("RAWLINE_FIREBASE_PROJECT_ID")?,
            required("RAWLINE_FIREBASE_API_KEY")?,
            required("RAWLINE_CLOUDINARY_CLOUD")?,
        );
        if let Some(preset) = lookup("RAWLINE_CLOUDINARY_PRESET") {
            config.cloudinary_preset = preset;
        }
        if let Some(folder) = lookup("RAWLINE_CLOUDINARY_FOLDER") {
            config.cloudinary_folder = folder;
        }
        config.gemini_api_key = lookup("RAWLINE_GEMINI_API_KEY").filter(|k| !k.is_empty());
        if let Some(model) = lookup("RAWLINE_GEMINI_MODEL") {
            config.gemini_model = model;
        }
        Ok(config)
    }

    /// Root of the document tree for this project.
    pub fn documents_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            FIRESTORE_BASE, self.firebase_project_id
        )
    }
}

pub fn default_cache_dir() -> PathBuf {
    if let Some(cache) = dirs::cache_dir() {
        cache.join("rawline-sdk")
    } else {
        PathBuf::from(".rawline-sdk-cache")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn from_lookup_requires_project_settings() {
        let vars: HashMap<&str, &str> = HashMap::from([("RAWLINE_FIREBASE_API_KEY", "k")]);
        let err = RawlineConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap_err();
        assert!(err.to_string().contains("RAWLINE_FIREBASE_PROJECT_ID"));
    }

    #[test]
    fn from_lookup_applies_defaults() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("RAWLINE_FIREBASE_PROJECT_ID", "rawline-test"),
            ("RAWLINE_FIREBASE_API_KEY", "key"),
            ("RAWLINE_CLOUDINARY_CLOUD", "cloud"),
        ]);
        let config = RawlineConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.cloudinary_preset, DEFAULT_UPLOAD_PRESET);
        assert_eq!(config.cloudinary_folder, DEFAULT_UPLOAD_FOLDER);
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
        assert!(config.gemini_api_key.is_none());
        assert_eq!(
            config.documents_url(),
            "https://firestore.googleapis.com/v1/projects/rawline-test/databases/(default)/documents"
        );
    }
}
