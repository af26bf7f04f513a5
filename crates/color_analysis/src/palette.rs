use std::{collections::HashMap, fs, path::Path};

use shared::domain::Rgb;
use tracing::debug;

use crate::{lab::ciede2000, Lab, AnalysisError};

pub const DEFAULT_MATCH_THRESHOLD: f64 = 40.0;

/// Allowed clothing colors per season, keyed by season name.
#[derive(Debug, Clone, Default)]
pub struct SeasonPalettes {
    palettes: HashMap<String, Vec<Rgb>>,
}

impl SeasonPalettes {
    pub fn from_json(raw: &str) -> Result<Self, AnalysisError> {
        let palettes: HashMap<String, Vec<Rgb>> = serde_json::from_str(raw)?;
        Ok(Self { palettes })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| AnalysisError::PaletteFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn palette(&self, season: &str) -> Result<&[Rgb], AnalysisError> {
        self.palettes
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(season.trim()))
            .map(|(_, colors)| colors.as_slice())
            .ok_or_else(|| AnalysisError::UnknownSeason(season.to_string()))
    }

    /// The palette color closest to `color`, with its CIEDE2000 distance.
    pub fn nearest(&self, color: Rgb, season: &str) -> Result<Option<(Rgb, f64)>, AnalysisError> {
        let target = Lab::from_rgb(color);
        Ok(self
            .palette(season)?
            .iter()
            .map(|candidate| (*candidate, ciede2000(target, Lab::from_rgb(*candidate))))
            .min_by(|a, b| a.1.total_cmp(&b.1)))
    }

    pub fn is_allowed(&self, color: Rgb, season: &str, threshold: f64) -> Result<bool, AnalysisError> {
        let nearest = self.nearest(color, season)?;
        debug!(%color, season, ?nearest, threshold, "palette match");
        Ok(nearest.is_some_and(|(_, distance)| distance < threshold))
    }
}
