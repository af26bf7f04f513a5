//! Color analysis behind the upload flows: undertone detection, lighting
//! checks, seasonal classification, clothing color estimation and palette
//! matching.

use shared::domain::Undertone;
use thiserror::Error;

pub mod clothing;
pub mod lab;
pub mod lighting;
pub mod palette;
pub mod season;
pub mod undertone;

pub use clothing::{clothing_color, median_subject_color};
pub use image::RgbImage;
pub use lab::{ciede2000, Lab};
pub use lighting::{analyze_lighting, LightingStats};
pub use palette::{SeasonPalettes, DEFAULT_MATCH_THRESHOLD};
pub use season::{classify_season, SeasonMatch, SeasonProfile, SEASONS};
pub use undertone::{detect_undertone, UndertoneEstimate};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("image contains no pixels")]
    EmptyImage,
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("unknown season '{0}'")]
    UnknownSeason(String),
    #[error("no season accepts undertone '{0}'")]
    NoCandidates(Undertone),
    #[error("failed to read palettes from {path}: {source}")]
    PaletteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid palette file: {0}")]
    PaletteFormat(#[from] serde_json::Error),
}

/// Decodes PNG or JPEG bytes into an 8-bit RGB buffer.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, AnalysisError> {
    let image = image::load_from_memory(bytes)?.to_rgb8();
    if image.width() == 0 || image.height() == 0 {
        return Err(AnalysisError::EmptyImage);
    }
    Ok(image)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
