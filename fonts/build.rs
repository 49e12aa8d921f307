use std::env;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;
use zip::ZipArchive;

const TEXT_ZIP_URL: &str =
    "https://github.com/dejavu-fonts/dejavu-fonts/releases/download/version_2_37/dejavu-fonts-ttf-2.37.zip";
const TEXT_FONT_NAME: &str = "DejaVuSans.ttf";
const BARCODE_URL: &str =
    "https://github.com/google/fonts/raw/main/ofl/librebarcode39/LibreBarcode39-Regular.ttf";
const BARCODE_FONT_NAME: &str = "LibreBarcode39-Regular.ttf";

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=TEXT_FONT_TTF");
    println!("cargo:rerun-if-env-changed=BARCODE_FONT_TTF");

    provide_font(
        &out_dir.join(TEXT_FONT_NAME),
        "TEXT_FONT_TTF",
        |target| fetch_text_font_from_zip(&out_dir, target),
    );
    provide_font(
        &out_dir.join(BARCODE_FONT_NAME),
        "BARCODE_FONT_TTF",
        |target| download(BARCODE_URL, target),
    );
}

/// Materialize one font file at `target`: keep an existing copy, honor the
/// env override, otherwise try to download. On failure an empty file is
/// written so the build proceeds; consumers check for empty bytes at run
/// time before rendering.
fn provide_font(target: &Path, env_key: &str, fetch: impl Fn(&Path) -> bool) {
    if target.exists() && fs::metadata(target).map(|m| m.len() > 0).unwrap_or(false) {
        return;
    }
    if let Ok(path) = env::var(env_key) {
        match fs::copy(PathBuf::from(&path), target) {
            Ok(_) => return,
            Err(e) => eprintln!("warning: failed to copy {env_key}={path}: {e}"),
        }
    }
    if fetch(target) {
        return;
    }
    eprintln!(
        "warning: could not obtain {}; sheet rendering will refuse to run. \
         Set {} or allow network access.",
        target.display(),
        env_key
    );
    let _ = fs::write(target, []);
}

fn download(url: &str, target: &Path) -> bool {
    let dest = target.to_str().unwrap();
    let curl = Command::new("curl")
        .args(["-L", "-f", "-s", "-o", dest, url])
        .status();
    if matches!(curl, Ok(st) if st.success()) && non_empty(target) {
        return true;
    }
    let wget = Command::new("wget").args(["-q", "-O", dest, url]).status();
    matches!(wget, Ok(st) if st.success()) && non_empty(target)
}

fn non_empty(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}

/// The text face ships inside the DejaVu release zip; pull just the one TTF.
fn fetch_text_font_from_zip(out_dir: &Path, target: &Path) -> bool {
    let zip_path = out_dir.join("dejavu-fonts-ttf.zip");
    if !download(TEXT_ZIP_URL, &zip_path) {
        return false;
    }
    let mut data = Vec::new();
    let Ok(mut f) = fs::File::open(&zip_path) else {
        return false;
    };
    if f.read_to_end(&mut data).is_err() {
        return false;
    }
    let Ok(mut zip) = ZipArchive::new(std::io::Cursor::new(data)) else {
        return false;
    };
    for i in 0..zip.len() {
        let Ok(mut file) = zip.by_index(i) else {
            continue;
        };
        if file.name().ends_with(&format!("/{TEXT_FONT_NAME}")) {
            let mut buf = Vec::new();
            if std::io::copy(&mut file, &mut buf).is_ok() && fs::write(target, &buf).is_ok() {
                return true;
            }
            return false;
        }
    }
    eprintln!("warning: {TEXT_FONT_NAME} not found in release zip");
    false
}
