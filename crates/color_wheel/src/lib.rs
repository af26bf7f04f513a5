//! Radial color-wheel layout and single-selection engine.
//!
//! A wheel is `N` equal pie wedges laid out clockwise from angle 0. Colors
//! cycle through a base palette, so a wheel may have more sectors than hues.

use std::f64::consts::{PI, TAU};

use shared::{
    domain::{ColorSector, Rgb, SectorId},
    protocol::WheelSnapshot,
};
use thiserror::Error;
use tracing::debug;

mod svg;

pub use svg::{render_svg, SvgOptions};

pub const DEFAULT_SECTOR_COUNT: usize = 52;

/// Twelve evenly spaced rainbow hues, starting at red.
pub const BASE_HUES: [Rgb; 12] = [
    Rgb::new(0xFF, 0x00, 0x00),
    Rgb::new(0xFF, 0x7F, 0x00),
    Rgb::new(0xFF, 0xFF, 0x00),
    Rgb::new(0x7F, 0xFF, 0x00),
    Rgb::new(0x00, 0xFF, 0x00),
    Rgb::new(0x00, 0xFF, 0x7F),
    Rgb::new(0x00, 0xFF, 0xFF),
    Rgb::new(0x00, 0x7F, 0xFF),
    Rgb::new(0x00, 0x00, 0xFF),
    Rgb::new(0x7F, 0x00, 0xFF),
    Rgb::new(0xFF, 0x00, 0xFF),
    Rgb::new(0xFF, 0x00, 0x7F),
];

pub const VIEWBOX_SIZE: f64 = 100.0;
pub const WHEEL_CENTER: f64 = VIEWBOX_SIZE / 2.0;
pub const WHEEL_RADIUS: f64 = VIEWBOX_SIZE / 2.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WheelError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub fn sector_label(id: SectorId) -> String {
    format!("Color {}", id.0 + 1)
}

pub fn generate_sectors(count: usize, palette: &[Rgb]) -> Result<Vec<ColorSector>, WheelError> {
    if count == 0 {
        return Err(WheelError::InvalidArgument(
            "sector count must be positive".into(),
        ));
    }
    if palette.is_empty() {
        return Err(WheelError::InvalidArgument(
            "palette must contain at least one color".into(),
        ));
    }

    Ok((0..count)
        .map(|i| {
            let id = SectorId(i);
            ColorSector {
                id,
                label: sector_label(id),
                color_value: palette[i % palette.len()],
            }
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectorGeometry {
    pub start_angle: f64,
    pub end_angle: f64,
    pub large_arc_flag: u8,
    pub arc_path: String,
}

fn boundary_angle(index: usize, count: usize) -> f64 {
    (index as f64 / count as f64) * TAU
}

fn point_on_rim(angle: f64) -> (f64, f64) {
    (
        WHEEL_CENTER + WHEEL_RADIUS * angle.cos(),
        WHEEL_CENTER + WHEEL_RADIUS * angle.sin(),
    )
}

/// Formats an SVG coordinate with at most four decimals, without trailing
/// zeros or a negative zero.
pub(crate) fn fmt_coord(value: f64) -> String {
    let value = if value.abs() < 5e-5 { 0.0 } else { value };
    let text = format!("{value:.4}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    text.to_string()
}

pub fn sector_geometry(id: SectorId, count: usize) -> Result<SectorGeometry, WheelError> {
    if count == 0 {
        return Err(WheelError::InvalidArgument(
            "sector count must be positive".into(),
        ));
    }
    if id.0 >= count {
        return Err(WheelError::InvalidArgument(format!(
            "sector {id} is outside a wheel of {count} sectors"
        )));
    }

    let start_angle = boundary_angle(id.0, count);
    let end_angle = boundary_angle(id.0 + 1, count);
    let large_arc_flag = u8::from(end_angle - start_angle > PI);

    let (x1, y1) = point_on_rim(start_angle);
    let (x2, y2) = point_on_rim(end_angle);
    let center = fmt_coord(WHEEL_CENTER);
    let radius = fmt_coord(WHEEL_RADIUS);
    let arc_path = if count == 1 {
        // A full turn has coincident arc endpoints, which SVG renders as
        // nothing. Split it into two half circles through the opposite rim.
        let (xm, ym) = point_on_rim(start_angle + PI);
        format!(
            "M {center} {center} L {x1} {y1} A {radius} {radius} 0 0 1 {xm} {ym} A {radius} {radius} 0 0 1 {x1} {y1} Z",
            x1 = fmt_coord(x1),
            y1 = fmt_coord(y1),
            xm = fmt_coord(xm),
            ym = fmt_coord(ym),
        )
    } else {
        format!(
            "M {center} {center} L {} {} A {radius} {radius} 0 {large_arc_flag} 1 {} {} Z",
            fmt_coord(x1),
            fmt_coord(y1),
            fmt_coord(x2),
            fmt_coord(y2),
        )
    };

    Ok(SectorGeometry {
        start_angle,
        end_angle,
        large_arc_flag,
        arc_path,
    })
}

/// Receives the full sector record every time a sector is selected.
pub trait SelectionObserver: Send + Sync {
    fn sector_selected(&self, sector: &ColorSector);
}

impl<F> SelectionObserver for F
where
    F: Fn(&ColorSector) + Send + Sync,
{
    fn sector_selected(&self, sector: &ColorSector) {
        self(sector)
    }
}

/// One mounted wheel: a fixed sector set plus the single selected id.
pub struct ColorWheel {
    sectors: Vec<ColorSector>,
    selected: Option<SectorId>,
    observer: Option<Box<dyn SelectionObserver>>,
}

impl ColorWheel {
    pub fn new(count: usize, palette: &[Rgb]) -> Result<Self, WheelError> {
        Ok(Self {
            sectors: generate_sectors(count, palette)?,
            selected: None,
            observer: None,
        })
    }

    pub fn with_observer(mut self, observer: impl SelectionObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn sectors(&self) -> &[ColorSector] {
        &self.sectors
    }

    pub fn sector_count(&self) -> usize {
        self.sectors.len()
    }

    pub fn selected_id(&self) -> Option<SectorId> {
        self.selected
    }

    pub fn selected(&self) -> Option<&ColorSector> {
        self.selected.and_then(|id| self.sectors.get(id.0))
    }

    pub fn is_selected(&self, id: SectorId) -> bool {
        self.selected == Some(id)
    }

    /// Selects `id` and notifies the observer, even when `id` is already the
    /// selected sector.
    pub fn select(&mut self, id: SectorId) -> Result<&ColorSector, WheelError> {
        let sector = self.sectors.get(id.0).ok_or_else(|| {
            WheelError::InvalidArgument(format!(
                "sector {id} is outside a wheel of {} sectors",
                self.sectors.len()
            ))
        })?;

        debug!(sector_id = id.0, previous = ?self.selected, "sector selected");
        self.selected = Some(id);
        if let Some(observer) = &self.observer {
            observer.sector_selected(sector);
        }
        Ok(sector)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn geometry(&self, id: SectorId) -> Result<SectorGeometry, WheelError> {
        sector_geometry(id, self.sectors.len())
    }

    pub fn snapshot(&self) -> WheelSnapshot {
        WheelSnapshot {
            sectors: self.sectors.clone(),
            selected: self.selected,
        }
    }

    pub fn to_svg(&self, options: &SvgOptions) -> String {
        render_svg(&self.sectors, self.selected, options)
    }
}

impl Default for ColorWheel {
    fn default() -> Self {
        Self {
            sectors: (0..DEFAULT_SECTOR_COUNT)
                .map(|i| ColorSector {
                    id: SectorId(i),
                    label: sector_label(SectorId(i)),
                    color_value: BASE_HUES[i % BASE_HUES.len()],
                })
                .collect(),
            selected: None,
            observer: None,
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
