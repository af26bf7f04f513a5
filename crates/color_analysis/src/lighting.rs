use image::RgbImage;
use shared::{domain::Rgb, protocol::LightingReport};

use crate::{lab::Lab, AnalysisError};

const BRIGHTNESS_RANGE: (f64, f64) = (100.0, 300.0);
const TEMPERATURE_RANGE: (f64, f64) = (0.0, 555.0);
const MIN_CONTRAST: f64 = 50.0;
const MAX_UNIFORMITY: f64 = 75.0;

/// Statistics over the packed 8-bit Lab channels of a photo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingStats {
    pub mean_brightness: f64,
    pub contrast: f64,
    pub mean_temperature: f64,
    pub uniformity: f64,
}

pub fn lighting_stats(image: &RgbImage) -> Result<LightingStats, AnalysisError> {
    let pixel_count = image.width() as usize * image.height() as usize;
    if pixel_count == 0 {
        return Err(AnalysisError::EmptyImage);
    }

    let packed: Vec<[f64; 3]> = image
        .pixels()
        .map(|pixel| Lab::from_rgb(Rgb::from(pixel.0)).packed())
        .collect();

    let n = pixel_count as f64;
    let mean_brightness = packed.iter().map(|p| p[0]).sum::<f64>() / n;
    let mean_temperature = packed.iter().map(|p| p[2]).sum::<f64>() / n;
    let (min_l, max_l) = packed.iter().fold((f64::MAX, f64::MIN), |(lo, hi), p| {
        (lo.min(p[0]), hi.max(p[0]))
    });
    let variance = packed
        .iter()
        .map(|p| (p[0] - mean_brightness).powi(2))
        .sum::<f64>()
        / n;

    Ok(LightingStats {
        mean_brightness,
        contrast: max_l - min_l,
        mean_temperature,
        uniformity: variance.sqrt(),
    })
}

pub fn lighting_feedback(stats: &LightingStats) -> Vec<String> {
    let mut feedback = Vec::new();
    if !(BRIGHTNESS_RANGE.0..=BRIGHTNESS_RANGE.1).contains(&stats.mean_brightness) {
        feedback.push("Adjust brightness to fall within the acceptable range.".to_string());
    }
    if stats.contrast < MIN_CONTRAST {
        feedback.push("Increase contrast by improving lighting.".to_string());
    }
    if stats.mean_temperature < TEMPERATURE_RANGE.0 {
        feedback.push("Lighting appears too cool (bluish).".to_string());
    } else if stats.mean_temperature > TEMPERATURE_RANGE.1 {
        feedback.push("Lighting appears too warm (yellowish).".to_string());
    }
    if stats.uniformity > MAX_UNIFORMITY {
        feedback.push("Lighting is uneven. Avoid shadows or highlights.".to_string());
    }
    feedback
}

pub fn analyze_lighting(image: &RgbImage) -> Result<LightingReport, AnalysisError> {
    let stats = lighting_stats(image)?;
    let feedback = lighting_feedback(&stats);
    Ok(LightingReport {
        valid: feedback.is_empty(),
        feedback,
    })
}
