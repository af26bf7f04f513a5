use image::{ImageFormat, RgbImage};
use shared::{
    domain::{Rgb, Undertone},
    protocol::SeasonMatchKind,
};

use super::*;
use crate::{
    lighting::{lighting_feedback, lighting_stats},
    season::find_season,
    undertone::classify_hue,
};

fn solid(width: u32, height: u32, rgb: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, image::Rgb(rgb))
}

#[test]
fn lab_of_white_and_black() {
    let white = Lab::from_rgb(Rgb::new(255, 255, 255));
    assert!((white.l - 100.0).abs() < 0.01);
    assert!(white.a.abs() < 0.05 && white.b.abs() < 0.05);

    let black = Lab::from_rgb(Rgb::new(0, 0, 0));
    assert!(black.l.abs() < 1e-9);
    assert!(black.packed()[0].abs() < 1e-9);
}

#[test]
fn red_is_a_warm_hue() {
    let red = Lab::from_rgb(Rgb::new(255, 0, 0));
    assert!(red.a > 70.0);
    assert!(red.hue_degrees() < 69.0);
}

#[test]
fn ciede2000_matches_reference_pair() {
    let first = Lab {
        l: 50.0,
        a: 2.6772,
        b: -79.7751,
    };
    let second = Lab {
        l: 50.0,
        a: 0.0,
        b: -82.7485,
    };
    assert!((ciede2000(first, second) - 2.0425).abs() < 1e-3);
    assert!(ciede2000(first, first).abs() < 1e-9);
}

#[test]
fn undertone_thresholds() {
    assert_eq!(classify_hue(4.9, 200.0), Undertone::Neutral);
    assert_eq!(classify_hue(20.0, 45.0), Undertone::Warm);
    assert_eq!(classify_hue(20.0, 330.0), Undertone::Warm);
    assert_eq!(classify_hue(20.0, 200.0), Undertone::Cool);
}

#[test]
fn detects_warm_and_cool_photos() {
    let warm = detect_undertone(&solid(4, 4, [220, 150, 110]));
    assert_eq!(warm.undertone, Undertone::Warm);

    let cool = detect_undertone(&solid(4, 4, [90, 120, 200]));
    assert_eq!(cool.undertone, Undertone::Cool);

    let gray = detect_undertone(&solid(4, 4, [128, 128, 128]));
    assert_eq!(gray.undertone, Undertone::Neutral);
}

#[test]
fn fully_masked_image_is_neutral() {
    let estimate = detect_undertone(&solid(3, 3, [0, 200, 200]));
    assert_eq!(estimate.undertone, Undertone::Neutral);
    assert_eq!(estimate.mean_chroma, 0.0);
    assert_eq!(estimate.mean_hue, 0.0);
}

#[test]
fn flat_image_fails_contrast_check() {
    let stats = lighting_stats(&solid(8, 8, [180, 160, 150])).expect("stats");
    assert_eq!(stats.contrast, 0.0);
    assert!(stats.uniformity < 1e-9);
    let feedback = lighting_feedback(&stats);
    assert_eq!(feedback, vec!["Increase contrast by improving lighting.".to_string()]);
}

#[test]
fn balanced_image_passes_lighting() {
    let mut image = solid(10, 10, [200, 180, 170]);
    for x in 0..10 {
        image.put_pixel(x, 0, image::Rgb([90, 80, 75]));
    }
    let report = analyze_lighting(&image).expect("report");
    assert!(report.valid, "unexpected feedback: {:?}", report.feedback);
}

#[test]
fn dark_image_is_flagged_for_brightness() {
    let mut image = solid(10, 10, [20, 20, 20]);
    image.put_pixel(0, 0, image::Rgb([200, 200, 200]));
    let report = analyze_lighting(&image).expect("report");
    assert!(!report.valid);
    assert!(report
        .feedback
        .iter()
        .any(|line| line.starts_with("Adjust brightness")));
}

#[test]
fn decodes_png_bytes() {
    let image = solid(2, 2, [10, 20, 30]);
    let mut bytes = std::io::Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png).expect("encode");
    let decoded = decode_image(bytes.get_ref()).expect("decode");
    assert_eq!(decoded.get_pixel(1, 1).0, [10, 20, 30]);
    assert!(matches!(decode_image(b"not an image"), Err(AnalysisError::Decode(_))));
}

#[test]
fn exact_season_match() {
    let result = classify_season([195, 165, 145], [135, 105, 85], [75, 75, 55], Undertone::LightWarm)
        .expect("classify");
    assert_eq!(result, SeasonMatch::Exact(find_season("Light Spring").expect("season")));
    assert_eq!(result.to_response().match_kind, SeasonMatchKind::Exact);
}

#[test]
fn neutral_undertone_reaches_light_spring() {
    let result = classify_season([195, 165, 145], [135, 105, 85], [75, 75, 55], Undertone::Neutral)
        .expect("classify");
    assert_eq!(result.primary().name, "Light Spring");
}

#[test]
fn ambiguous_match_keeps_table_order() {
    let first = find_season("Light Spring").expect("season");
    let second = find_season("Soft Autumn").expect("season");
    let result = SeasonMatch::Ambiguous(vec![first, second]);
    let response = result.to_response();
    assert_eq!(response.season, "Light Spring");
    assert_eq!(response.match_kind, SeasonMatchKind::Ambiguous);
    assert_eq!(response.alternatives, vec!["Soft Autumn".to_string()]);
}

#[test]
fn falls_back_to_closest_season() {
    let result = classify_season([250, 250, 250], [10, 10, 10], [200, 200, 200], Undertone::Warm)
        .expect("classify");
    let SeasonMatch::Closest { season, distance } = &result else {
        panic!("expected closest match, got {result:?}");
    };
    assert!(season.accepts(Undertone::Warm));
    assert!(*distance > 0.0);
    for other in SEASONS.iter().filter(|s| s.accepts(Undertone::Warm)) {
        assert!(other.centroid_distance([250, 250, 250], [10, 10, 10], [200, 200, 200]) >= *distance);
    }
    assert_eq!(result.to_response().match_kind, SeasonMatchKind::Closest);
}

#[test]
fn undertone_filter_excludes_other_seasons() {
    let skin = [155, 135, 145];
    let hair = [45, 45, 55];
    let eye = [35, 35, 45];

    let cool = classify_season(skin, hair, eye, Undertone::Cool).expect("classify");
    assert_eq!(cool, SeasonMatch::Exact(find_season("True Winter").expect("season")));

    let warm = classify_season(skin, hair, eye, Undertone::Warm).expect("classify");
    assert!(matches!(warm, SeasonMatch::Closest { .. }));
    assert!(warm.primary().accepts(Undertone::Warm));
}

#[test]
fn palette_matching_uses_threshold() {
    let palettes = SeasonPalettes::from_json(r##"{"True Winter": ["#000000", "#0000CD"]}"##)
        .expect("palettes");
    assert!(palettes
        .is_allowed(Rgb::new(5, 5, 5), "true winter", DEFAULT_MATCH_THRESHOLD)
        .expect("allowed"));
    assert!(!palettes
        .is_allowed(Rgb::new(255, 255, 0), "True Winter", 10.0)
        .expect("allowed"));
    assert!(matches!(
        palettes.is_allowed(Rgb::new(0, 0, 0), "Endless Summer", 10.0),
        Err(AnalysisError::UnknownSeason(_))
    ));
}

#[test]
fn malformed_palette_file_is_rejected() {
    assert!(matches!(
        SeasonPalettes::from_json(r#"{"True Winter": ["black"]}"#),
        Err(AnalysisError::PaletteFormat(_))
    ));
}

#[test]
fn bundled_palettes_cover_every_season() {
    let raw = include_str!("../../../../palettes.json");
    let palettes = SeasonPalettes::from_json(raw).expect("palettes");
    for season in SEASONS.iter() {
        assert!(
            !palettes.palette(season.name).expect("palette").is_empty(),
            "{} has no colors",
            season.name
        );
    }
}

/// A navy garment with a small red logo on a white backdrop.
fn garment_photo() -> RgbImage {
    RgbImage::from_fn(40, 40, |x, y| {
        if !(8..32).contains(&x) {
            image::Rgb([255, 255, 255])
        } else if (18..21).contains(&x) && (4..7).contains(&y) {
            image::Rgb([200, 40, 40])
        } else {
            image::Rgb([20, 30, 90])
        }
    })
}

#[test]
fn median_ignores_white_background() {
    assert_eq!(median_subject_color(&garment_photo()), Rgb::new(20, 30, 90));

    let mut two_tone = solid(2, 1, [10, 20, 30]);
    two_tone.put_pixel(1, 0, image::Rgb([21, 40, 60]));
    assert_eq!(median_subject_color(&two_tone), Rgb::new(15, 30, 45));

    assert_eq!(
        median_subject_color(&solid(3, 3, [252, 251, 255])),
        Rgb::new(0, 0, 0)
    );
}

#[test]
fn clothing_color_picks_garment_cluster() {
    assert_eq!(clothing_color(&garment_photo()), Rgb::new(20, 30, 90));
    assert_eq!(clothing_color(&solid(5, 5, [120, 60, 30])), Rgb::new(120, 60, 30));
}

#[test]
fn cluster_centers_separate_distinct_colors() {
    let mut samples = vec![[0, 0, 0]; 10];
    samples.extend(vec![[200, 200, 200]; 10]);
    let centers = crate::clothing::cluster_centers(&samples, 2);
    assert_eq!(centers, vec![[0.0; 3], [200.0; 3]]);
    assert!(crate::clothing::cluster_centers(&[], 4).is_empty());
}
