use image::RgbImage;
use shared::domain::{Rgb, Undertone};

use crate::lab::Lab;

/// Mean chroma below this reads as neutral.
const NEUTRAL_CHROMA: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UndertoneEstimate {
    pub undertone: Undertone,
    pub mean_chroma: f64,
    pub mean_hue: f64,
}

/// Pixels with any channel at zero are masked out.
fn is_valid_pixel(pixel: &image::Rgb<u8>) -> bool {
    pixel.0.iter().all(|channel| *channel >= 1)
}

pub fn classify_hue(mean_chroma: f64, mean_hue: f64) -> Undertone {
    if mean_chroma < NEUTRAL_CHROMA {
        Undertone::Neutral
    } else if (0.0..=69.0).contains(&mean_hue) || (300.0..=360.0).contains(&mean_hue) {
        Undertone::Warm
    } else {
        Undertone::Cool
    }
}

/// Averages Lab hue and chroma over the unmasked pixels and maps the result
/// to warm, cool or neutral.
pub fn detect_undertone(image: &RgbImage) -> UndertoneEstimate {
    let mut hue_sum = 0.0;
    let mut chroma_sum = 0.0;
    let mut valid = 0usize;

    for pixel in image.pixels().filter(|pixel| is_valid_pixel(pixel)) {
        let lab = Lab::from_rgb(Rgb::from(pixel.0));
        hue_sum += lab.hue_degrees();
        chroma_sum += lab.chroma();
        valid += 1;
    }

    let (mean_hue, mean_chroma) = if valid == 0 {
        (0.0, 0.0)
    } else {
        (hue_sum / valid as f64, chroma_sum / valid as f64)
    };

    UndertoneEstimate {
        undertone: classify_hue(mean_chroma, mean_hue),
        mean_chroma,
        mean_hue,
    }
}
