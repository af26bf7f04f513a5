//! Seasonal color classification from skin, hair and eye colors.
//!
//! Each season owns an axis-aligned RGB box per feature. A person matches a
//! season when all three feature colors fall inside its boxes; otherwise the
//! season with the nearest box centroids wins.

use shared::{
    domain::Undertone,
    protocol::{ClassifySeasonResponse, SeasonMatchKind},
};
use tracing::debug;

use crate::AnalysisError;

use Undertone::{Cool, LightCool, LightWarm, Neutral, Warm};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorBox {
    pub min: [u8; 3],
    pub max: [u8; 3],
}

impl ColorBox {
    const fn new(min: [u8; 3], max: [u8; 3]) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, color: [u8; 3]) -> bool {
        (0..3).all(|i| self.min[i] <= color[i] && color[i] <= self.max[i])
    }

    /// Integer midpoint of the box, per channel.
    pub fn centroid(&self) -> [u8; 3] {
        [0, 1, 2].map(|i| ((u16::from(self.min[i]) + u16::from(self.max[i])) / 2) as u8)
    }
}

fn distance(first: [u8; 3], second: [u8; 3]) -> f64 {
    (0..3)
        .map(|i| (f64::from(first[i]) - f64::from(second[i])).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonProfile {
    pub name: &'static str,
    pub undertones: &'static [Undertone],
    pub skin: ColorBox,
    pub hair: ColorBox,
    pub eye: ColorBox,
}

impl SeasonProfile {
    pub fn accepts(&self, undertone: Undertone) -> bool {
        self.undertones.contains(&undertone)
    }

    pub fn contains(&self, skin: [u8; 3], hair: [u8; 3], eye: [u8; 3]) -> bool {
        self.skin.contains(skin) && self.hair.contains(hair) && self.eye.contains(eye)
    }

    pub fn centroid_distance(&self, skin: [u8; 3], hair: [u8; 3], eye: [u8; 3]) -> f64 {
        distance(skin, self.skin.centroid())
            + distance(hair, self.hair.centroid())
            + distance(eye, self.eye.centroid())
    }
}

macro_rules! season {
    ($name:literal, [$($tone:expr),+], $skin:expr, $hair:expr, $eye:expr) => {
        SeasonProfile {
            name: $name,
            undertones: &[$($tone),+],
            skin: ColorBox::new($skin.0, $skin.1),
            hair: ColorBox::new($hair.0, $hair.1),
            eye: ColorBox::new($eye.0, $eye.1),
        }
    };
}

pub static SEASONS: [SeasonProfile; 16] = [
    season!("Light Spring", [LightWarm, Neutral],
        ([190, 160, 140], [200, 170, 150]), ([130, 100, 80], [140, 110, 90]), ([70, 70, 50], [80, 80, 60])),
    season!("True Spring", [Warm],
        ([201, 171, 151], [210, 180, 160]), ([141, 111, 91], [150, 120, 100]), ([81, 71, 51], [90, 80, 60])),
    season!("Warm Spring", [Warm],
        ([211, 181, 161], [220, 190, 170]), ([151, 121, 101], [160, 130, 110]), ([91, 72, 52], [100, 90, 70])),
    season!("Bright Spring", [Warm, Neutral],
        ([221, 191, 171], [230, 200, 180]), ([161, 131, 111], [170, 140, 120]), ([101, 73, 53], [110, 100, 80])),
    season!("Light Summer", [LightCool, Neutral],
        ([180, 160, 150], [190, 170, 160]), ([100, 90, 90], [110, 100, 100]), ([60, 60, 60], [70, 70, 70])),
    season!("True Summer", [Cool],
        ([191, 171, 161], [200, 180, 170]), ([111, 101, 101], [120, 110, 110]), ([71, 61, 61], [80, 70, 70])),
    season!("Cool Summer", [Cool],
        ([201, 181, 171], [210, 190, 180]), ([121, 111, 111], [130, 120, 120]), ([81, 62, 62], [90, 80, 80])),
    season!("Soft Summer", [LightCool, Neutral],
        ([211, 191, 181], [220, 200, 190]), ([131, 121, 121], [140, 130, 130]), ([91, 63, 63], [100, 90, 90])),
    season!("Soft Autumn", [Neutral, LightWarm],
        ([160, 130, 110], [170, 140, 120]), ([90, 60, 40], [100, 70, 50]), ([50, 50, 40], [60, 60, 50])),
    season!("True Autumn", [Warm],
        ([171, 141, 121], [180, 150, 130]), ([101, 71, 51], [110, 80, 60]), ([61, 51, 41], [70, 60, 50])),
    season!("Warm Autumn", [Warm],
        ([181, 151, 131], [190, 160, 140]), ([111, 81, 61], [120, 90, 70]), ([71, 52, 42], [80, 70, 60])),
    season!("Deep Autumn", [Warm, Neutral],
        ([191, 161, 141], [200, 170, 150]), ([121, 91, 71], [130, 100, 80]), ([81, 53, 43], [90, 80, 70])),
    season!("True Winter", [Cool],
        ([150, 130, 140], [160, 140, 150]), ([40, 40, 50], [50, 50, 60]), ([30, 30, 40], [40, 40, 50])),
    season!("Bright Winter", [Cool, Neutral],
        ([161, 141, 151], [170, 150, 160]), ([51, 51, 61], [60, 60, 70]), ([41, 31, 41], [50, 40, 50])),
    season!("Cool Winter", [Cool, LightCool],
        ([171, 151, 161], [180, 160, 170]), ([61, 61, 71], [70, 70, 80]), ([51, 32, 42], [60, 50, 60])),
    season!("Deep Winter", [Cool, Neutral],
        ([181, 161, 171], [190, 170, 180]), ([71, 71, 81], [80, 80, 90]), ([61, 33, 43], [70, 60, 70])),
];

pub fn find_season(name: &str) -> Option<&'static SeasonProfile> {
    SEASONS
        .iter()
        .find(|season| season.name.eq_ignore_ascii_case(name.trim()))
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeasonMatch {
    Exact(&'static SeasonProfile),
    /// Several boxes matched; the first in table order is the primary.
    Ambiguous(Vec<&'static SeasonProfile>),
    Closest {
        season: &'static SeasonProfile,
        distance: f64,
    },
}

impl SeasonMatch {
    pub fn primary(&self) -> &'static SeasonProfile {
        match self {
            SeasonMatch::Exact(season) => *season,
            SeasonMatch::Ambiguous(seasons) => seasons[0],
            SeasonMatch::Closest { season, .. } => *season,
        }
    }

    pub fn kind(&self) -> SeasonMatchKind {
        match self {
            SeasonMatch::Exact(_) => SeasonMatchKind::Exact,
            SeasonMatch::Ambiguous(_) => SeasonMatchKind::Ambiguous,
            SeasonMatch::Closest { .. } => SeasonMatchKind::Closest,
        }
    }

    pub fn to_response(&self) -> ClassifySeasonResponse {
        let (alternatives, message) = match self {
            SeasonMatch::Exact(_) => (
                Vec::new(),
                "Color season classification successful.".to_string(),
            ),
            SeasonMatch::Ambiguous(seasons) => (
                seasons[1..].iter().map(|s| s.name.to_string()).collect(),
                "Multiple seasons matched; showing the first.".to_string(),
            ),
            SeasonMatch::Closest { .. } => (
                Vec::new(),
                "No exact match; showing the closest season.".to_string(),
            ),
        };
        ClassifySeasonResponse {
            season: self.primary().name.to_string(),
            match_kind: self.kind(),
            alternatives,
            message,
        }
    }
}

pub fn classify_season(
    skin: [u8; 3],
    hair: [u8; 3],
    eye: [u8; 3],
    undertone: Undertone,
) -> Result<SeasonMatch, AnalysisError> {
    let candidates: Vec<&'static SeasonProfile> =
        SEASONS.iter().filter(|season| season.accepts(undertone)).collect();

    let exact: Vec<_> = candidates
        .iter()
        .copied()
        .filter(|season| season.contains(skin, hair, eye))
        .collect();
    debug!(?skin, ?hair, ?eye, %undertone, exact = exact.len(), "classifying season");

    match exact.len() {
        0 => {}
        1 => return Ok(SeasonMatch::Exact(exact[0])),
        _ => return Ok(SeasonMatch::Ambiguous(exact)),
    }

    candidates
        .into_iter()
        .map(|season| (season, season.centroid_distance(skin, hair, eye)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(season, distance)| SeasonMatch::Closest { season, distance })
        .ok_or(AnalysisError::NoCandidates(undertone))
}
