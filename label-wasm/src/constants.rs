//! Front-end constants: zoom bounds and the fixed title choices offered by
//! the dropdown.

/// Grid zoom bounds and step for the on-screen preview.
pub const ZOOM_MIN: f64 = 0.5;
pub const ZOOM_MAX: f64 = 2.0;
pub const ZOOM_STEP: f64 = 0.1;

/// Pixel density of the print document handed to the print window.
pub const PRINT_PX_PER_IN: f64 = 96.0;
/// Pixel density of the downloadable sheet PNG.
pub const EXPORT_PX_PER_IN: f64 = 300.0;

/// Organization name offered by the title dropdown.
pub const ORG_TITLE: &str = "Fresno Unified School District";
/// Default dropdown choice: the org name with the serial marker line.
pub const ORG_SERIAL_TITLE: &str = "Fresno Unified School District - SERIAL";

/// Resolve the title dropdown into the form value handed to the edit
/// engine. An empty custom text resolves to no title at all, which never
/// erases an existing one.
pub fn resolve_title(choice: &str, custom: &str) -> Option<String> {
    match choice {
        "default" => Some(ORG_SERIAL_TITLE.to_string()),
        "org" => Some(ORG_TITLE.to_string()),
        "custom" => {
            let custom = custom.trim();
            (!custom.is_empty()).then(|| custom.to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropdown_resolution() {
        assert_eq!(resolve_title("default", "").as_deref(), Some(ORG_SERIAL_TITLE));
        assert_eq!(resolve_title("org", "ignored").as_deref(), Some(ORG_TITLE));
        assert_eq!(resolve_title("custom", "  Room 12 ").as_deref(), Some("Room 12"));
        assert_eq!(resolve_title("custom", "   "), None);
        assert_eq!(resolve_title("bogus", "x"), None);
    }
}
