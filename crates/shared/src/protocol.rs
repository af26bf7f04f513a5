use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ColorSector, Rgb, SectorId, Undertone, UserId};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectSectorRequest {
    pub sector_id: SectorId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WheelSnapshot {
    pub sectors: Vec<ColorSector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<SectorId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifySeasonRequest {
    pub skin: [u8; 3],
    pub hair: [u8; 3],
    pub eye: [u8; 3],
    pub undertone: Undertone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonMatchKind {
    Exact,
    Ambiguous,
    Closest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifySeasonResponse {
    pub season: String,
    pub match_kind: SeasonMatchKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyColorRequest {
    pub color: Rgb,
    pub season: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyColorResponse {
    pub allowed: bool,
    pub message: String,
}

/// Query for classifying the garment in an uploaded photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyClothingQuery {
    pub season: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyClothingResponse {
    pub allowed: bool,
    pub clothing_color: Rgb,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightingReport {
    pub valid: bool,
    pub feedback: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndertoneReport {
    pub undertone: Undertone,
    pub mean_chroma: f64,
    pub mean_hue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    ColorSelected {
        user_id: UserId,
        sector: ColorSector,
        selected_at: DateTime<Utc>,
    },
}
