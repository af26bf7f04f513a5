use image::RgbImage;
use shared::domain::Rgb;
use tracing::debug;

/// A pixel with every channel at or above this is background.
pub const WHITE_THRESHOLD: u8 = 250;
pub const CLUSTER_COUNT: usize = 4;
const MAX_ITERATIONS: usize = 10;
const CONVERGENCE_EPSILON: f64 = 1.0;
/// Clustering runs on an evenly strided sample of at most this many pixels.
const MAX_SAMPLES: usize = 65_536;

fn is_background(pixel: &image::Rgb<u8>) -> bool {
    pixel.0.iter().all(|channel| *channel >= WHITE_THRESHOLD)
}

fn median(values: &mut [u8]) -> u8 {
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        ((u16::from(values[mid - 1]) + u16::from(values[mid])) / 2) as u8
    } else {
        values[mid]
    }
}

/// Per-channel median of the non-background pixels, or black when the
/// whole image is background.
pub fn median_subject_color(image: &RgbImage) -> Rgb {
    let mut channels: [Vec<u8>; 3] = Default::default();
    for pixel in image.pixels().filter(|pixel| !is_background(pixel)) {
        for (values, channel) in channels.iter_mut().zip(pixel.0) {
            values.push(channel);
        }
    }
    if channels[0].is_empty() {
        return Rgb::new(0, 0, 0);
    }
    let [r, g, b] = &mut channels;
    Rgb::new(median(r), median(g), median(b))
}

fn to_point(rgb: [u8; 3]) -> [f64; 3] {
    rgb.map(f64::from)
}

fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn nearest_index(centers: &[[f64; 3]], point: [f64; 3]) -> usize {
    centers
        .iter()
        .enumerate()
        .min_by(|a, b| distance(*a.1, point).total_cmp(&distance(*b.1, point)))
        .map(|(index, _)| index)
        .unwrap_or(0)
}

/// Lloyd's k-means. Centers start at evenly spaced quantiles of the samples
/// ordered by channel sum, so the result is deterministic.
pub fn cluster_centers(samples: &[[u8; 3]], k: usize) -> Vec<[f64; 3]> {
    let k = k.min(samples.len());
    if k == 0 {
        return Vec::new();
    }
    let mut ordered = samples.to_vec();
    ordered.sort_by_key(|rgb| rgb.iter().map(|c| u16::from(*c)).sum::<u16>());
    let mut centers: Vec<[f64; 3]> = (0..k)
        .map(|i| to_point(ordered[(2 * i + 1) * ordered.len() / (2 * k)]))
        .collect();

    for iteration in 0..MAX_ITERATIONS {
        let mut sums = vec![[0.0; 3]; k];
        let mut counts = vec![0usize; k];
        for sample in samples {
            let point = to_point(*sample);
            let index = nearest_index(&centers, point);
            counts[index] += 1;
            for (sum, value) in sums[index].iter_mut().zip(point) {
                *sum += value;
            }
        }

        let mut shift = 0.0_f64;
        for ((center, sum), count) in centers.iter_mut().zip(&sums).zip(&counts) {
            // An empty cluster keeps its previous center.
            if *count == 0 {
                continue;
            }
            let next = (*sum).map(|value| value / *count as f64);
            shift = shift.max(distance(*center, next));
            *center = next;
        }
        if shift < CONVERGENCE_EPSILON {
            debug!(iteration, "k-means converged");
            break;
        }
    }
    centers
}

/// Estimates the dominant garment color of a product photo on a white
/// background: the cluster center closest to the median subject color.
pub fn clothing_color(image: &RgbImage) -> Rgb {
    let median = median_subject_color(image);

    let pixel_count = image.width() as usize * image.height() as usize;
    let stride = pixel_count.div_ceil(MAX_SAMPLES).max(1);
    let samples: Vec<[u8; 3]> = image.pixels().step_by(stride).map(|pixel| pixel.0).collect();

    let target = to_point([median.r, median.g, median.b]);
    let color = cluster_centers(&samples, CLUSTER_COUNT)
        .into_iter()
        .min_by(|a, b| distance(*a, target).total_cmp(&distance(*b, target)))
        .map(|center| {
            let [r, g, b] = center.map(|value| value.clamp(0.0, 255.0) as u8);
            Rgb::new(r, g, b)
        })
        .unwrap_or(median);
    debug!(%median, %color, "clothing color estimated");
    color
}
