use png::{BitDepth, ColorType, Compression, Encoder, FilterType};
use serde::Deserialize;
use std::env;
use std::fs;

use label_core::{Calibration, Slot};

/// Saved sheet: the labels in grid order plus the session calibration.
#[derive(Clone, Debug, Default, Deserialize)]
struct SheetFile {
    #[serde(default)]
    labels: Vec<Slot>,
    #[serde(default)]
    calibration: Calibration,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: sheet <labels.json> <output.(svg|png|pdf)> [px_per_in]");
        std::process::exit(2);
    }
    let input = &args[1];
    let output = &args[2];
    let px_per_in: f64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(300.0);

    let txt = fs::read_to_string(input)?;
    let file: SheetFile = serde_json::from_str(&txt)?;
    let capacity = sheet_core::PageGeometry::letter().capacity();
    if file.labels.len() > capacity {
        eprintln!(
            "warning: {} labels exceed one page of {}; extras are dropped",
            file.labels.len(),
            capacity
        );
    }

    let (svg, w_px, h_px) = sheet_core::build_sheet_svg(&file.labels, file.calibration, px_per_in);

    if output.ends_with(".svg") {
        fs::write(output, svg)?;
        return Ok(());
    }
    if output.ends_with(".pdf") {
        return write_pdf(&svg, output);
    }
    write_png(&svg, w_px, h_px, output)
}

/// Font database with both embedded faces, shared by the raster and PDF
/// paths. Rendering without real fonts would silently drop every glyph, so
/// missing embeds are an error rather than a degraded output.
fn load_fontdb() -> Result<usvg::fontdb::Database, Box<dyn std::error::Error>> {
    if fonts::TEXT_FONT_BYTES.is_empty() || fonts::BARCODE_FONT_BYTES.is_empty() {
        return Err(
            "embedded fonts are missing; rebuild with network access or set \
             TEXT_FONT_TTF / BARCODE_FONT_TTF"
                .into(),
        );
    }
    let mut fontdb = usvg::fontdb::Database::new();
    fontdb.load_font_data(fonts::TEXT_FONT_BYTES.to_vec());
    fontdb.load_font_data(fonts::BARCODE_FONT_BYTES.to_vec());
    fontdb.set_sans_serif_family("DejaVu Sans");
    Ok(fontdb)
}

fn write_png(
    svg: &str,
    w_px: u32,
    h_px: u32,
    output: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut opt = usvg::Options::default();
    opt.fontdb = std::sync::Arc::new(load_fontdb()?);
    let tree = usvg::Tree::from_str(svg, &opt).map_err(|e| format!("SVG parse error: {e:?}"))?;
    let mut pixmap = tiny_skia::Pixmap::new(w_px, h_px).ok_or("pixmap alloc failed")?;
    let mut pm = pixmap.as_mut();
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pm);
    encode_png_deterministic(&pixmap, output)
}

/// PDF output goes through svg2pdf's own usvg, which carries its own tree
/// types; the fonts are loaded into its database the same way.
fn write_pdf(svg: &str, output: &str) -> Result<(), Box<dyn std::error::Error>> {
    if fonts::TEXT_FONT_BYTES.is_empty() || fonts::BARCODE_FONT_BYTES.is_empty() {
        return Err(
            "embedded fonts are missing; rebuild with network access or set \
             TEXT_FONT_TTF / BARCODE_FONT_TTF"
                .into(),
        );
    }
    let mut fontdb = svg2pdf::usvg::fontdb::Database::new();
    fontdb.load_font_data(fonts::TEXT_FONT_BYTES.to_vec());
    fontdb.load_font_data(fonts::BARCODE_FONT_BYTES.to_vec());
    fontdb.set_sans_serif_family("DejaVu Sans");
    let mut opt = svg2pdf::usvg::Options::default();
    opt.fontdb = std::sync::Arc::new(fontdb);
    let tree = svg2pdf::usvg::Tree::from_str(svg, &opt)
        .map_err(|e| format!("SVG parse error: {e:?}"))?;
    let pdf = svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|e| format!("PDF conversion error: {e:?}"))?;
    fs::write(output, pdf)?;
    Ok(())
}

fn encode_png_deterministic(
    pixmap: &tiny_skia::Pixmap,
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = std::fs::File::create(path)?;
    let w = pixmap.width();
    let h = pixmap.height();
    let mut enc = Encoder::new(file, w, h);
    enc.set_color(ColorType::Rgba);
    enc.set_depth(BitDepth::Eight);
    enc.set_filter(FilterType::NoFilter);
    enc.set_compression(Compression::Default);
    let mut writer = enc.write_header()?;
    writer.write_image_data(pixmap.data())?;
    Ok(())
}
