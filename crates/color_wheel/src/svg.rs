use std::fmt::Write as _;

use shared::{
    domain::{ColorSector, SectorId},
    html::escape_html,
};

use crate::{fmt_coord, sector_geometry, VIEWBOX_SIZE, WHEEL_CENTER};

const SELECTED_STROKE: &str = "#000";
const IDLE_STROKE: &str = "#fff";

#[derive(Debug, Clone)]
pub struct SvgOptions {
    pub size_px: u32,
    /// Link target for each wedge; `{id}` is replaced with the sector id.
    pub select_href: Option<String>,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            size_px: 420,
            select_href: None,
        }
    }
}

/// Renders the wheel as a standalone SVG document. The wedges are drawn
/// inside a group rotated -90 degrees so sector 0 starts at twelve o'clock.
/// The selected wedge gets a heavier black stroke.
pub fn render_svg(sectors: &[ColorSector], selected: Option<SectorId>, options: &SvgOptions) -> String {
    let count = sectors.len();
    let center = fmt_coord(WHEEL_CENTER);
    let mut out = String::new();

    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="color-wheel" width="{size}" height="{size}" viewBox="0 0 {view} {view}">"#,
        size = options.size_px,
        view = fmt_coord(VIEWBOX_SIZE),
    );
    let _ = writeln!(out, r#"  <g transform="rotate(-90 {center} {center})">"#);

    for sector in sectors {
        let Ok(geometry) = sector_geometry(sector.id, count) else {
            continue;
        };
        let is_selected = selected == Some(sector.id);
        let (stroke, stroke_width) = if is_selected {
            (SELECTED_STROKE, 2)
        } else {
            (IDLE_STROKE, 1)
        };
        let hex = sector.color_value.to_hex();
        let path = format!(
            r#"<path d="{d}" fill="{hex}" stroke="{stroke}" stroke-width="{stroke_width}" data-sector-id="{id}"{aria}><title>{title}</title></path>"#,
            d = geometry.arc_path,
            id = sector.id.0,
            aria = if is_selected { r#" aria-selected="true""# } else { "" },
            title = escape_html(&format!("{} {hex}", sector.label)),
        );

        match &options.select_href {
            Some(template) => {
                let href = template.replace("{id}", &sector.id.0.to_string());
                let _ = writeln!(out, r#"    <a href="{}">{path}</a>"#, escape_html(&href));
            }
            None => {
                let _ = writeln!(out, "    {path}");
            }
        }
    }

    out.push_str("  </g>\n</svg>\n");
    out
}
