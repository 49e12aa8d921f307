//! Embedded fonts for deterministic sheet rendering: a text face for label
//! titles and the Code 39 face the barcode line is set in.
//!
//! Either byte slice may be empty when the build could not obtain the font
//! (no network and no env override); consumers must check before rendering.

/// DejaVu Sans, used for titles and serial subtitles.
pub static TEXT_FONT_BYTES: &[u8] =
    include_bytes!(concat!(env!("OUT_DIR"), "/DejaVuSans.ttf"));

/// Libre Barcode 39, the `*`-delimited barcode line.
pub static BARCODE_FONT_BYTES: &[u8] =
    include_bytes!(concat!(env!("OUT_DIR"), "/LibreBarcode39-Regular.ttf"));
