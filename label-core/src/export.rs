//! Read-only CSV view of the grid for the spreadsheet export boundary.

use crate::slots::SlotGrid;

/// Serialize all non-empty slots as `Title,Serial` rows. Returns `None`
/// when no slot carries content, so callers can alert instead of producing
/// an empty file.
pub fn export_csv(grid: &SlotGrid) -> Option<String> {
    let rows: Vec<String> = grid
        .iter()
        .filter(|slot| !slot.is_empty())
        .map(|slot| format!("{},{}", csv_field(&slot.title), csv_field(&slot.serial)))
        .collect();
    if rows.is_empty() {
        return None;
    }
    let mut out = String::from("Title,Serial\n");
    for row in rows {
        out.push_str(&row);
        out.push('\n');
    }
    Some(out)
}

/// Quote a field when it contains a delimiter, quote or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
