//! Controller connection configuration.
//!
//! Settings are layered: struct defaults, then an optional TOML file, then
//! `NDFC_*` environment variables, later sources winning. No state is
//! persisted locally; everything the library manages lives on the
//! controller.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Connection settings for one NDFC/DCNM controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Base URL of the controller, e.g. `https://ndfc.example.com`
    pub host: String,

    /// Login username
    pub username: String,

    /// Session token sent with every request, when already established
    pub token: Option<String>,

    /// Verify the controller's TLS certificate
    pub verify_tls: bool,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            host: "https://localhost".to_string(),
            username: "admin".to_string(),
            token: None,
            verify_tls: true,
            timeout_secs: 30,
        }
    }
}

impl ControllerConfig {
    /// Loads configuration, layering defaults, an optional file, and the
    /// `NDFC_*` environment (e.g. `NDFC_HOST`, `NDFC_VERIFY_TLS`).
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path.to_path_buf()));
        }

        builder = builder.add_source(config::Environment::with_prefix("NDFC"));

        Ok(builder.build()?.try_deserialize()?)
    }
}
