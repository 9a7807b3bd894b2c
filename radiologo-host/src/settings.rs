//! Persisted user settings
//!
//! A small TOML file remembering the port, model and wire options between
//! runs. Every field is optional; values given on the command line are
//! overlaid on top of the file before use.
//!
//! ```toml
//! port = "/dev/ttyUSB0"
//! model = "UV-5RM"
//! region = "EU"
//! address_mode = "chunk_index"
//! pixel_order = "rgb565"
//! chunk_size = 1024
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use radiologo_core::UploadSettings;
use radiologo_protocol::{AddressMode, PixelOrder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid settings in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to encode settings: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// User settings kept between runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_mode: Option<AddressMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_order: Option<PixelOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
}

impl HostSettings {
    pub fn parse(text: &str, path: &Path) -> Result<Self, SettingsError> {
        toml::from_str(text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path`; a missing file yields empty settings
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text, path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let text = toml::to_string(self)?;
        fs::write(path, text).map_err(|source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Replace fields with every value set in `other`
    pub fn overlay(&mut self, other: HostSettings) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field;
                })*
            };
        }
        take!(port, model, region, address_mode, pixel_order, chunk_size);
    }

    /// Apply the wire options on top of model defaults
    pub fn apply(&self, mut base: UploadSettings) -> UploadSettings {
        if let Some(mode) = self.address_mode {
            base.address_mode = mode;
        }
        if let Some(order) = self.pixel_order {
            base.pixel_order = order;
        }
        if let Some(size) = self.chunk_size {
            base.chunk_size = size;
        }
        base
    }

    /// Region is known once the user has named one
    pub fn region_known(&self) -> bool {
        self.region.as_deref().is_some_and(|r| !r.trim().is_empty())
    }
}
