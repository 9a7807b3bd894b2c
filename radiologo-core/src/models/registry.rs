//! Known A5-protocol radios
//!
//! All of these share the same 160x128 logo, baud rate and handshake. The
//! table exists so the host can validate a user-supplied model name and
//! derive default upload settings from it.

use radiologo_protocol::commands::{
    BAUD_RATE, DEFAULT_CHUNK_SIZE, HANDSHAKE_MAGIC, LOGO_HEIGHT, LOGO_WIDTH,
};
use radiologo_protocol::{AddressMode, PixelOrder};

use crate::config::UploadSettings;

/// Static description of one radio model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelConfig {
    pub name: &'static str,
    pub vendor: &'static str,
    pub baud_rate: u32,
    pub magic: &'static [u8],
    pub logo_width: usize,
    pub logo_height: usize,
    pub pixel_order: PixelOrder,
    pub address_mode: AddressMode,
    pub chunk_size: usize,
}

impl ModelConfig {
    const fn a5(name: &'static str) -> Self {
        Self {
            name,
            vendor: "Baofeng",
            baud_rate: BAUD_RATE,
            magic: HANDSHAKE_MAGIC,
            logo_width: LOGO_WIDTH,
            logo_height: LOGO_HEIGHT,
            pixel_order: PixelOrder::Rgb565,
            address_mode: AddressMode::ChunkIndex,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Logo payload size in bytes (two bytes per pixel)
    pub const fn payload_size(&self) -> usize {
        self.logo_width * self.logo_height * 2
    }

    /// Default upload settings for this model
    pub fn upload_settings(&self) -> UploadSettings {
        UploadSettings {
            baud_rate: self.baud_rate,
            handshake_magic: self.magic,
            chunk_size: self.chunk_size,
            address_mode: self.address_mode,
            pixel_order: self.pixel_order,
            image_size: self.payload_size(),
            ..UploadSettings::default()
        }
    }
}

static MODELS: [ModelConfig; 5] = [
    ModelConfig::a5("UV-5RM"),
    ModelConfig::a5("UV-17Pro"),
    ModelConfig::a5("UV-17R"),
    ModelConfig::a5("UV-17R Pro"),
    ModelConfig::a5("UV-5RH Pro"),
];

/// Every registered model
pub fn models() -> &'static [ModelConfig] {
    &MODELS
}

/// Look up a model by exact name, ignoring ASCII case
pub fn find_model(name: &str) -> Option<&'static ModelConfig> {
    let name = name.trim();
    MODELS.iter().find(|m| m.name.eq_ignore_ascii_case(name))
}
