//! Print layout engine: maps the logical label grid onto a physical page
//! with calibrated offsets and emits a self-contained SVG document that the
//! print subsystem renders. This crate never touches a device.

use png::{BitDepth, ColorType, Encoder};
use serde::{Deserialize, Serialize};

use label_core::{Calibration, ColorTag, Slot};

pub const MM_PER_IN: f64 = 25.4;
/// CSS reference pixel density; on-screen styling is authored in 96dpi px.
const CSS_PX_PER_IN: f64 = 96.0;

/// Physical page and label dimensions, all in inches.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PageGeometry {
    pub page_w: f64,
    pub page_h: f64,
    pub label_w: f64,
    pub label_h: f64,
    pub h_gap: f64,
    pub v_gap: f64,
    pub rows: usize,
    pub cols: usize,
    /// Fixed correction for the printer's own unavoidable margin.
    pub baseline_x: f64,
    pub baseline_y: f64,
}

impl PageGeometry {
    /// US letter sheet of 15 x 4 labels, the stock the tool is built for.
    pub fn letter() -> PageGeometry {
        PageGeometry {
            page_w: 8.5,
            page_h: 11.0,
            label_w: 1.75,
            label_h: 0.66,
            h_gap: 0.30,
            v_gap: 0.0,
            rows: 15,
            cols: 4,
            baseline_x: 0.50 / MM_PER_IN,
            baseline_y: 0.28 / MM_PER_IN,
        }
    }

    pub fn capacity(&self) -> usize {
        self.rows * self.cols
    }

    pub fn grid_w(&self) -> f64 {
        self.cols as f64 * self.label_w + (self.cols - 1) as f64 * self.h_gap
    }

    pub fn grid_h(&self) -> f64 {
        self.rows as f64 * self.label_h + (self.rows - 1) as f64 * self.v_gap
    }

    /// Top-left placement offset of the grid: page centering plus the
    /// baseline correction plus the user calibration (mm converted to
    /// inches). Calibration is additive to the working default, so a zero
    /// calibration reproduces the baseline-corrected centered layout.
    pub fn grid_offset(&self, calibration: Calibration) -> (f64, f64) {
        (
            (self.page_w - self.grid_w()) / 2.0 + self.baseline_x + calibration.x_mm / MM_PER_IN,
            (self.page_h - self.grid_h()) / 2.0 + self.baseline_y + calibration.y_mm / MM_PER_IN,
        )
    }
}

impl Default for PageGeometry {
    fn default() -> PageGeometry {
        PageGeometry::letter()
    }
}

/// Physical rectangle of one label on the page, in inches from the top-left
/// corner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Row-major placements for the first `count` slots, silently capped to one
/// page worth. Overflow beyond the page is dropped, not paginated.
pub fn layout(geom: &PageGeometry, calibration: Calibration, count: usize) -> Vec<Placement> {
    let (ox, oy) = geom.grid_offset(calibration);
    (0..count.min(geom.capacity()))
        .map(|index| {
            let col = (index % geom.cols) as f64;
            let row = (index / geom.cols) as f64;
            Placement {
                index,
                x: ox + col * (geom.label_w + geom.h_gap),
                y: oy + row * (geom.label_h + geom.v_gap),
                w: geom.label_w,
                h: geom.label_h,
            }
        })
        .collect()
}

/// Build the printable sheet as a standalone SVG document, returning the
/// markup and its pixel dimensions.
///
/// Per-label visuals follow the on-screen styling: background band stack per
/// color tag, bold title with the two-way contrast rule, the serial rendered
/// once in the Code 39 font between `*` sentinels and once as a plain
/// subtitle.
pub fn build_sheet_svg(
    slots: &[Slot],
    calibration: Calibration,
    px_per_in: f64,
) -> (String, u32, u32) {
    build_sheet_svg_with(&PageGeometry::letter(), slots, calibration, px_per_in)
}

pub fn build_sheet_svg_with(
    geom: &PageGeometry,
    slots: &[Slot],
    calibration: Calibration,
    px_per_in: f64,
) -> (String, u32, u32) {
    let w_px = (geom.page_w * px_per_in).ceil() as u32;
    let h_px = (geom.page_h * px_per_in).ceil() as u32;
    let px = |v: f64| v * px_per_in;
    // Font sizes were authored in 96dpi CSS px; keep their physical size.
    let fs = |css_px: f64| css_px * px_per_in / CSS_PX_PER_IN;
    let corner_px = fs(11.0);

    let mut s = String::new();
    s.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    s.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\" font-family=\"sans-serif\">\n",
        w_px, h_px, w_px, h_px
    ));
    s.push_str("<rect x=\"0\" y=\"0\" width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>\n");

    for place in layout(geom, calibration, slots.len()) {
        let slot = &slots[place.index];
        if slot.is_empty() && slot.color == ColorTag::Default {
            continue;
        }
        let (x, y) = (px(place.x), px(place.y));
        let (w, h) = (px(place.w), px(place.h));

        if let Some(hex) = slot.color.hex() {
            let clip = format!("label-clip-{}", place.index);
            s.push_str(&format!(
                "<clipPath id=\"{}\"><rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{:.2}\"/></clipPath>\n",
                clip, x, y, w, h, corner_px
            ));
            s.push_str(&format!("<g clip-path=\"url(#{})\">\n", clip));
            s.push_str(&band_rects(slot.color, hex, x, y, w, h));
            s.push_str("</g>\n");
        }

        let cx = x + w / 2.0;
        let title_fs = fs(10.0);
        let barcode_fs = fs(14.0);
        let subtitle_fs = fs(10.0);
        if !slot.title.is_empty() {
            s.push_str(&format!(
                "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-size=\"{:.2}\" font-weight=\"bold\" fill=\"{}\">{}</text>\n",
                cx,
                y + h / 2.0 - fs(10.0),
                title_fs,
                slot.color.title_text(),
                svg_escape(&slot.title)
            ));
        }
        if let Some(barcode) = slot.barcode_text() {
            // White chip behind the barcode so bands never swallow the bars.
            let chip_w = barcode.chars().count() as f64 * barcode_fs * 0.62;
            let chip_h = barcode_fs * 1.1;
            s.push_str(&format!(
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{:.2}\" fill=\"white\"/>\n",
                cx - chip_w / 2.0,
                y + h / 2.0 - chip_h * 0.55,
                chip_w,
                chip_h,
                fs(2.0)
            ));
            s.push_str(&format!(
                "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"Libre Barcode 39\" font-size=\"{:.2}\" fill=\"black\">{}</text>\n",
                cx,
                y + h / 2.0 + barcode_fs * 0.35,
                barcode_fs,
                svg_escape(&barcode)
            ));
            s.push_str(&format!(
                "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-size=\"{:.2}\" font-weight=\"bold\" fill=\"black\">{}</text>\n",
                cx,
                y + h / 2.0 + fs(22.0),
                subtitle_fs,
                svg_escape(&slot.serial)
            ));
        }
    }
    s.push_str("</svg>\n");
    (s, w_px, h_px)
}

/// Background band stack of one colored label, top-down in page space.
/// Blue fills the upper half on its own; every other color gets a blue cap
/// band over its own band over white.
fn band_rects(color: ColorTag, hex: &str, x: f64, y: f64, w: f64, h: f64) -> String {
    let rect = |y0: f64, frac: f64, fill: &str| {
        format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"/>\n",
            x,
            y + y0 * h,
            w,
            frac * h,
            fill
        )
    };
    let mut out = rect(0.0, 1.0, "white");
    if color == ColorTag::Blue {
        out.push_str(&rect(0.0, 0.5, hex));
    } else {
        out.push_str(&rect(0.0, 0.25, "#0000FF"));
        out.push_str(&rect(0.25, 0.25, hex));
    }
    out
}

fn svg_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Shared PNG encoder: RGBA -> PNG bytes (deterministic for same input).
pub fn encode_rgba_to_png_bytes(
    width: u32,
    height: u32,
    rgba: &[u8],
) -> Result<Vec<u8>, png::EncodingError> {
    let mut buf = Vec::new();
    {
        let mut enc = Encoder::new(&mut buf, width, height);
        enc.set_color(ColorType::Rgba);
        enc.set_depth(BitDepth::Eight);
        {
            let mut writer = enc.write_header()?;
            writer.write_image_data(rgba)?;
        }
        // the encoder must drop before buf can be moved out
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use label_core::SlotGrid;

    const EPS: f64 = 1e-12;

    #[test]
    fn zero_calibration_is_centered_plus_baseline() {
        let geom = PageGeometry::letter();
        let (ox, oy) = geom.grid_offset(Calibration::default());
        let center_x = (geom.page_w - geom.grid_w()) / 2.0;
        let center_y = (geom.page_h - geom.grid_h()) / 2.0;
        assert!((ox - (center_x + geom.baseline_x)).abs() < EPS);
        assert!((oy - (center_y + geom.baseline_y)).abs() < EPS);
    }

    #[test]
    fn calibration_is_additive() {
        let geom = PageGeometry::letter();
        let (zx, zy) = geom.grid_offset(Calibration::default());
        for (x_mm, y_mm) in [(1.0, -2.5), (0.5, 0.28), (-12.7, 25.4)] {
            let (ox, oy) = geom.grid_offset(Calibration { x_mm, y_mm });
            assert!((ox - zx - x_mm / MM_PER_IN).abs() < EPS);
            assert!((oy - zy - y_mm / MM_PER_IN).abs() < EPS);
        }
    }

    #[test]
    fn layout_is_row_major_with_gaps() {
        let geom = PageGeometry::letter();
        let places = layout(&geom, Calibration::default(), 8);
        assert_eq!(places.len(), 8);
        let first = places[0];
        // Next column over.
        assert!((places[1].x - first.x - (geom.label_w + geom.h_gap)).abs() < EPS);
        assert!((places[1].y - first.y).abs() < EPS);
        // First slot of the second row.
        assert!((places[4].x - first.x).abs() < EPS);
        assert!((places[4].y - first.y - (geom.label_h + geom.v_gap)).abs() < EPS);
    }

    #[test]
    fn layout_caps_to_one_page() {
        let geom = PageGeometry::letter();
        assert_eq!(layout(&geom, Calibration::default(), 500).len(), 60);
        assert_eq!(layout(&geom, Calibration::default(), 0).len(), 0);
    }

    #[test]
    fn grid_footprint_matches_formula() {
        let geom = PageGeometry::letter();
        assert!((geom.grid_w() - (4.0 * 1.75 + 3.0 * 0.30)).abs() < EPS);
        assert!((geom.grid_h() - 15.0 * 0.66).abs() < EPS);
    }

    #[test]
    fn svg_has_page_dimensions_and_content() {
        let mut grid = SlotGrid::default();
        {
            let slot = grid.get_mut(0).unwrap();
            slot.title = "Ward A".to_string();
            slot.serial = "AB007".to_string();
            slot.color = ColorTag::Red;
        }
        let (svg, w, h) = build_sheet_svg(grid.slots(), Calibration::default(), 100.0);
        assert_eq!((w, h), (850, 1100));
        assert!(svg.contains("Ward A"));
        assert!(svg.contains("*AB007*"));
        assert!(svg.contains("Libre Barcode 39"));
        // Red band plus the blue cap band.
        assert!(svg.contains("#FF1A1A"));
        assert!(svg.contains("#0000FF"));
        // Colored label forces light title text.
        assert!(svg.contains("fill=\"white\">Ward A</text>"));
    }

    #[test]
    fn blue_label_has_no_cap_band() {
        let mut grid = SlotGrid::default();
        grid.get_mut(0).unwrap().serial = "B1".to_string();
        grid.get_mut(0).unwrap().color = ColorTag::Blue;
        let (svg, _, _) = build_sheet_svg(grid.slots(), Calibration::default(), 96.0);
        assert!(svg.contains("#045BDC"));
        assert!(!svg.contains("#0000FF"));
    }

    #[test]
    fn empty_slots_leave_the_page_blank() {
        let grid = SlotGrid::default();
        let (svg, _, _) = build_sheet_svg(grid.slots(), Calibration::default(), 96.0);
        assert!(!svg.contains("<text"));
        assert!(!svg.contains("clipPath"));
    }

    #[test]
    fn default_title_text_stays_dark() {
        let mut grid = SlotGrid::default();
        grid.get_mut(0).unwrap().title = "Plain".to_string();
        let (svg, _, _) = build_sheet_svg(grid.slots(), Calibration::default(), 96.0);
        assert!(svg.contains("fill=\"black\">Plain</text>"));
    }

    #[test]
    fn titles_are_svg_escaped() {
        let mut grid = SlotGrid::default();
        grid.get_mut(0).unwrap().title = "A<B & C".to_string();
        let (svg, _, _) = build_sheet_svg(grid.slots(), Calibration::default(), 96.0);
        assert!(svg.contains("A&lt;B &amp; C"));
    }
}
