//! Slot grid data model: one addressable label position per slot, a fixed
//! color palette and the session-scoped print calibration.

use serde::{Deserialize, Serialize};

/// Fixed label color palette. `Default` means no color band.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    #[default]
    Default,
    Blue,
    Red,
    Yellow,
    Green,
    Orange,
}

impl ColorTag {
    /// Hex value of the color band, `None` for the plain white label.
    pub fn hex(self) -> Option<&'static str> {
        match self {
            ColorTag::Default => None,
            ColorTag::Blue => Some("#045BDC"),
            ColorTag::Red => Some("#FF1A1A"),
            ColorTag::Yellow => Some("#FFD700"),
            ColorTag::Green => Some("#32CD32"),
            ColorTag::Orange => Some("#FFA500"),
        }
    }

    /// Title text color against this label background. Any color band is
    /// dark enough to need light text; the plain label keeps dark text.
    pub fn title_text(self) -> &'static str {
        match self {
            ColorTag::Default => "black",
            _ => "white",
        }
    }

    /// Parse a palette name as used in DOM data attributes and JSON.
    /// Unknown names fall back to `Default`.
    pub fn from_name(name: &str) -> ColorTag {
        match name {
            "blue" => ColorTag::Blue,
            "red" => ColorTag::Red,
            "yellow" => ColorTag::Yellow,
            "green" => ColorTag::Green,
            "orange" => ColorTag::Orange,
            _ => ColorTag::Default,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorTag::Default => "default",
            ColorTag::Blue => "blue",
            ColorTag::Red => "red",
            ColorTag::Yellow => "yellow",
            ColorTag::Green => "green",
            ColorTag::Orange => "orange",
        }
    }
}

/// One label position in the fixed grid. `index` is assigned at grid
/// creation and never changes; only content and the selected flag do.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Slot {
    pub index: usize,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub serial: String,
    #[serde(default)]
    pub color: ColorTag,
    #[serde(skip)]
    pub selected: bool,
}

impl Slot {
    /// Barcode display text: the serial wrapped in the Code 39 start/stop
    /// sentinel, or `None` when no serial is assigned.
    pub fn barcode_text(&self) -> Option<String> {
        if self.serial.is_empty() {
            None
        } else {
            Some(format!("*{}*", self.serial))
        }
    }

    /// Whether the slot carries any printable content.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.serial.is_empty()
    }

    /// Reset content to the blank state; selection is handled by the caller.
    pub fn clear_content(&mut self) {
        self.title.clear();
        self.serial.clear();
        self.color = ColorTag::Default;
    }
}

/// The ordered, fixed-size collection of slots. Slots are never added,
/// removed or reordered after creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SlotGrid {
    rows: usize,
    cols: usize,
    slots: Vec<Slot>,
}

impl SlotGrid {
    pub fn new(rows: usize, cols: usize) -> SlotGrid {
        let slots = (0..rows * cols)
            .map(|index| Slot {
                index,
                ..Slot::default()
            })
            .collect();
        SlotGrid { rows, cols, slots }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Slot> {
        self.slots.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Slot> {
        self.slots.iter()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }
}

impl Default for SlotGrid {
    fn default() -> SlotGrid {
        SlotGrid::new(crate::GRID_ROWS, crate::GRID_COLS)
    }
}

/// User-tunable print displacement in millimeters, applied on top of the
/// baseline-corrected centered layout. Lives only for the session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub x_mm: f64,
    pub y_mm: f64,
}

impl Calibration {
    /// Parse user-entered millimeter fields, falling back to 0 on anything
    /// unparseable.
    pub fn from_inputs(x: &str, y: &str) -> Calibration {
        Calibration {
            x_mm: x.trim().parse().unwrap_or(0.0),
            y_mm: y.trim().parse().unwrap_or(0.0),
        }
    }

    pub fn reset(&mut self) {
        *self = Calibration::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_indices_are_dense() {
        let grid = SlotGrid::default();
        assert_eq!(grid.len(), 60);
        for (i, slot) in grid.iter().enumerate() {
            assert_eq!(slot.index, i);
            assert!(slot.is_empty());
            assert!(!slot.selected);
        }
    }

    #[test]
    fn barcode_text_wraps_sentinels() {
        let mut slot = Slot::default();
        assert_eq!(slot.barcode_text(), None);
        slot.serial = "AB007".to_string();
        assert_eq!(slot.barcode_text().as_deref(), Some("*AB007*"));
    }

    #[test]
    fn contrast_rule_is_two_way() {
        assert_eq!(ColorTag::Default.title_text(), "black");
        for tag in [
            ColorTag::Blue,
            ColorTag::Red,
            ColorTag::Yellow,
            ColorTag::Green,
            ColorTag::Orange,
        ] {
            assert_eq!(tag.title_text(), "white");
        }
    }

    #[test]
    fn color_names_round_trip() {
        for tag in [
            ColorTag::Default,
            ColorTag::Blue,
            ColorTag::Red,
            ColorTag::Yellow,
            ColorTag::Green,
            ColorTag::Orange,
        ] {
            assert_eq!(ColorTag::from_name(tag.name()), tag);
        }
        assert_eq!(ColorTag::from_name("skyblue"), ColorTag::Default);
    }

    #[test]
    fn calibration_falls_back_to_zero() {
        let cal = Calibration::from_inputs("1.5", "nonsense");
        assert_eq!(cal.x_mm, 1.5);
        assert_eq!(cal.y_mm, 0.0);
        let cal = Calibration::from_inputs("", " -0.5 ");
        assert_eq!(cal.x_mm, 0.0);
        assert_eq!(cal.y_mm, -0.5);
    }

    #[test]
    fn slot_serde_skips_selection() {
        let mut slot = Slot {
            index: 3,
            title: "Ward A".to_string(),
            serial: "AB007".to_string(),
            color: ColorTag::Green,
            selected: true,
        };
        let json = serde_json::to_string(&slot).unwrap();
        assert!(json.contains("\"green\""));
        assert!(!json.contains("selected"));
        slot = serde_json::from_str(&json).unwrap();
        assert!(!slot.selected);
        assert_eq!(slot.color, ColorTag::Green);
    }
}
