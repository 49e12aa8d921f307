//! Session state machine: the current target set, the edit mode and the
//! batch-edit engine that consumes form values and advances the targets.

use serde::{Deserialize, Serialize};

use crate::serial::SerialSpec;
use crate::slots::{Calibration, ColorTag, SlotGrid};

/// How the target set evolves after an edit.
///
/// `Bulk` edits every targeted slot at once and then empties the set.
/// `Batch` edits only the active head and advances to the next-higher index,
/// the scanner-driven workflow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    #[default]
    Bulk,
    Batch,
}

/// Resolved form values for one edit call.
///
/// `title: None` (or empty) leaves existing titles untouched; an empty
/// `serial` leaves serials untouched; `color: None` leaves colors untouched
/// while `Some(ColorTag::Default)` explicitly removes the band.
#[derive(Clone, Debug, Default)]
pub struct EditForm {
    pub title: Option<String>,
    pub serial: String,
    pub color: Option<ColorTag>,
}

/// What one edit call did, for the caller to repaint and to prepare the next
/// scan.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditOutcome {
    /// Indices whose content changed, in target order.
    pub modified: Vec<usize>,
    /// Replacement value for the serial input: the next value in the
    /// sequence in batch mode, `None` (clear the field) otherwise.
    pub serial_input: Option<String>,
    /// Slot to scroll into view, batch mode only.
    pub focus: Option<usize>,
}

/// Session-scoped editing context: the grid, the target set, the edit mode
/// and the print calibration. One instance lives for the page session.
#[derive(Clone, Debug)]
pub struct Session {
    pub grid: SlotGrid,
    mode: EditMode,
    targets: Vec<usize>,
    pub calibration: Calibration,
}

impl Session {
    pub fn new(grid: SlotGrid) -> Session {
        Session {
            grid,
            mode: EditMode::default(),
            targets: Vec::new(),
            calibration: Calibration::default(),
        }
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    /// Switching mode never changes target membership, only how the next
    /// edit advances the set.
    pub fn set_mode(&mut self, mode: EditMode) {
        self.mode = mode;
    }

    /// Target indices in insertion (click) order.
    pub fn targets(&self) -> &[usize] {
        &self.targets
    }

    /// The slot a batch edit would hit next, for highlighting. `None` in
    /// bulk mode or with nothing selected.
    pub fn batch_focus(&self) -> Option<usize> {
        match self.mode {
            EditMode::Batch => self.targets.first().copied(),
            EditMode::Bulk => None,
        }
    }

    /// Click on a slot: select and append if it was not targeted, deselect
    /// and remove if it was. Out-of-range indices are ignored.
    pub fn toggle_slot(&mut self, index: usize) {
        let Some(slot) = self.grid.get_mut(index) else {
            return;
        };
        if let Some(pos) = self.targets.iter().position(|&i| i == index) {
            slot.selected = false;
            self.targets.remove(pos);
        } else {
            slot.selected = true;
            self.targets.push(index);
        }
    }

    /// Target every slot in index order.
    pub fn select_all(&mut self) {
        self.targets = (0..self.grid.len()).collect();
        for index in 0..self.grid.len() {
            if let Some(slot) = self.grid.get_mut(index) {
                slot.selected = true;
            }
        }
    }

    /// Clear the content of every targeted slot and empty the target set.
    pub fn clear_selection(&mut self) {
        for index in std::mem::take(&mut self.targets) {
            if let Some(slot) = self.grid.get_mut(index) {
                slot.clear_content();
                slot.selected = false;
            }
        }
    }

    /// Reset the whole grid to the blank state. Idempotent.
    pub fn clear_all(&mut self) {
        for index in 0..self.grid.len() {
            if let Some(slot) = self.grid.get_mut(index) {
                slot.clear_content();
                slot.selected = false;
            }
        }
        self.targets.clear();
    }

    /// Apply one edit to the current target set and advance it according to
    /// the mode. With an empty target set this is a silent no-op.
    pub fn apply_edit(&mut self, form: &EditForm) -> EditOutcome {
        if self.targets.is_empty() {
            return EditOutcome::default();
        }
        let serial_raw = form.serial.trim();
        let spec = (!serial_raw.is_empty()).then(|| SerialSpec::parse(serial_raw));
        match self.mode {
            EditMode::Batch => self.apply_batch(form, spec.as_ref()),
            EditMode::Bulk => self.apply_bulk(form, spec.as_ref()),
        }
    }

    fn apply_batch(&mut self, form: &EditForm, spec: Option<&SerialSpec>) -> EditOutcome {
        let index = self.targets[0];
        self.write_slot(index, form, spec, 0);
        // The edited head and any manually selected stragglers are all
        // deselected; the set is rebuilt around the next-higher index.
        for i in std::mem::take(&mut self.targets) {
            if let Some(slot) = self.grid.get_mut(i) {
                slot.selected = false;
            }
        }
        let next = index + 1;
        let focus = if next < self.grid.len() {
            if let Some(slot) = self.grid.get_mut(next) {
                slot.selected = true;
            }
            self.targets.push(next);
            Some(next)
        } else {
            None
        };
        EditOutcome {
            modified: vec![index],
            serial_input: spec.map(|s| s.successor(1)),
            focus,
        }
    }

    fn apply_bulk(&mut self, form: &EditForm, spec: Option<&SerialSpec>) -> EditOutcome {
        let targets = std::mem::take(&mut self.targets);
        for (position, &index) in targets.iter().enumerate() {
            self.write_slot(index, form, spec, position as u128);
            if let Some(slot) = self.grid.get_mut(index) {
                slot.selected = false;
            }
        }
        EditOutcome {
            modified: targets,
            serial_input: None,
            focus: None,
        }
    }

    fn write_slot(&mut self, index: usize, form: &EditForm, spec: Option<&SerialSpec>, offset: u128) {
        let Some(slot) = self.grid.get_mut(index) else {
            return;
        };
        if let Some(title) = form.title.as_deref() {
            let title = title.trim();
            if !title.is_empty() {
                slot.title = title.to_string();
            }
        }
        if let Some(spec) = spec {
            slot.serial = spec.successor(offset);
        }
        if let Some(color) = form.color {
            slot.color = color;
        }
    }
}

impl Default for Session {
    fn default() -> Session {
        Session::new(SlotGrid::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_session() -> Session {
        Session::new(SlotGrid::new(2, 3))
    }

    fn form(title: Option<&str>, serial: &str, color: Option<ColorTag>) -> EditForm {
        EditForm {
            title: title.map(str::to_string),
            serial: serial.to_string(),
            color,
        }
    }

    #[test]
    fn toggle_round_trips() {
        let mut s = small_session();
        s.toggle_slot(4);
        assert_eq!(s.targets(), &[4]);
        assert!(s.grid.get(4).unwrap().selected);
        s.toggle_slot(4);
        assert!(s.targets().is_empty());
        assert!(!s.grid.get(4).unwrap().selected);
    }

    #[test]
    fn toggle_keeps_click_order() {
        let mut s = small_session();
        s.toggle_slot(5);
        s.toggle_slot(1);
        s.toggle_slot(3);
        assert_eq!(s.targets(), &[5, 1, 3]);
        s.toggle_slot(1);
        assert_eq!(s.targets(), &[5, 3]);
    }

    #[test]
    fn toggle_out_of_range_is_ignored() {
        let mut s = small_session();
        s.toggle_slot(99);
        assert!(s.targets().is_empty());
    }

    #[test]
    fn every_target_is_selected() {
        let mut s = small_session();
        s.toggle_slot(0);
        s.toggle_slot(2);
        s.select_all();
        for &i in s.targets() {
            assert!(s.grid.get(i).unwrap().selected);
        }
        assert_eq!(s.targets().len(), s.grid.len());
    }

    #[test]
    fn mode_switch_preserves_membership() {
        let mut s = small_session();
        s.toggle_slot(1);
        s.toggle_slot(2);
        s.set_mode(EditMode::Batch);
        assert_eq!(s.targets(), &[1, 2]);
        s.set_mode(EditMode::Bulk);
        assert_eq!(s.targets(), &[1, 2]);
    }

    #[test]
    fn empty_target_set_is_a_noop() {
        let mut s = small_session();
        let out = s.apply_edit(&form(Some("Ward"), "AB001", Some(ColorTag::Red)));
        assert_eq!(out, EditOutcome::default());
        assert!(s.grid.iter().all(|slot| slot.is_empty()));
    }

    #[test]
    fn bulk_edit_seeds_contiguous_serials() {
        let mut s = Session::new(SlotGrid::new(2, 4));
        for i in [3, 5, 7] {
            s.toggle_slot(i);
        }
        let out = s.apply_edit(&form(None, "AB007", None));
        assert_eq!(out.modified, vec![3, 5, 7]);
        assert_eq!(out.serial_input, None);
        assert_eq!(s.grid.get(3).unwrap().serial, "AB007");
        assert_eq!(s.grid.get(5).unwrap().serial, "AB008");
        assert_eq!(s.grid.get(7).unwrap().serial, "AB009");
        assert!(s.targets().is_empty());
        assert!(s.grid.iter().all(|slot| !slot.selected));
    }

    #[test]
    fn bulk_serial_order_follows_click_order() {
        let mut s = small_session();
        s.toggle_slot(4);
        s.toggle_slot(0);
        s.apply_edit(&form(None, "N10", None));
        assert_eq!(s.grid.get(4).unwrap().serial, "N10");
        assert_eq!(s.grid.get(0).unwrap().serial, "N11");
    }

    #[test]
    fn batch_edit_advances_to_next_index() {
        let mut s = small_session();
        s.set_mode(EditMode::Batch);
        s.toggle_slot(2);
        let out = s.apply_edit(&form(Some("Ward"), "K08", Some(ColorTag::Blue)));
        assert_eq!(out.modified, vec![2]);
        assert_eq!(out.serial_input.as_deref(), Some("K09"));
        assert_eq!(out.focus, Some(3));
        assert_eq!(s.targets(), &[3]);
        assert!(s.grid.get(3).unwrap().selected);
        assert!(!s.grid.get(2).unwrap().selected);
        assert_eq!(s.grid.get(2).unwrap().serial, "K08");
        assert_eq!(s.batch_focus(), Some(3));
    }

    #[test]
    fn batch_advance_terminates_after_n_edits() {
        let n = 6;
        let mut s = Session::new(SlotGrid::new(2, 3));
        s.set_mode(EditMode::Batch);
        s.toggle_slot(0);
        let mut serial = "R001".to_string();
        let mut visited = Vec::new();
        for _ in 0..n {
            let out = s.apply_edit(&form(None, &serial, None));
            assert_eq!(out.modified.len(), 1);
            visited.push(out.modified[0]);
            serial = out.serial_input.unwrap();
        }
        assert_eq!(visited, (0..n).collect::<Vec<_>>());
        assert!(s.targets().is_empty());
        assert_eq!(s.apply_edit(&form(None, &serial, None)), EditOutcome::default());
        // Every slot received exactly one serial of the run.
        for (i, slot) in s.grid.iter().enumerate() {
            assert_eq!(slot.serial, format!("R{:03}", i + 1));
        }
    }

    #[test]
    fn batch_advance_ignores_other_selected_slots() {
        // The head is edited and the literal next index becomes the target,
        // even when other slots were manually selected first.
        let mut s = small_session();
        s.set_mode(EditMode::Batch);
        s.toggle_slot(1);
        s.toggle_slot(4);
        let out = s.apply_edit(&form(None, "B2", None));
        assert_eq!(out.modified, vec![1]);
        assert_eq!(s.targets(), &[2]);
        assert!(!s.grid.get(4).unwrap().selected);
    }

    #[test]
    fn empty_title_never_erases() {
        let mut s = small_session();
        s.toggle_slot(0);
        s.apply_edit(&form(Some("Storage"), "S01", None));
        assert_eq!(s.grid.get(0).unwrap().title, "Storage");

        s.toggle_slot(0);
        s.apply_edit(&form(None, "S02", None));
        assert_eq!(s.grid.get(0).unwrap().title, "Storage");

        s.toggle_slot(0);
        s.apply_edit(&form(Some("  "), "S03", None));
        assert_eq!(s.grid.get(0).unwrap().title, "Storage");
        assert_eq!(s.grid.get(0).unwrap().serial, "S03");
    }

    #[test]
    fn empty_serial_leaves_serials_alone() {
        let mut s = small_session();
        s.toggle_slot(0);
        s.apply_edit(&form(None, "S01", None));
        s.toggle_slot(0);
        let out = s.apply_edit(&form(Some("Retitled"), "", Some(ColorTag::Red)));
        assert_eq!(out.modified, vec![0]);
        let slot = s.grid.get(0).unwrap();
        assert_eq!(slot.serial, "S01");
        assert_eq!(slot.title, "Retitled");
        assert_eq!(slot.color, ColorTag::Red);
    }

    #[test]
    fn explicit_default_color_removes_band() {
        let mut s = small_session();
        s.toggle_slot(0);
        s.apply_edit(&form(None, "S01", Some(ColorTag::Orange)));
        s.toggle_slot(0);
        s.apply_edit(&form(None, "", Some(ColorTag::Default)));
        assert_eq!(s.grid.get(0).unwrap().color, ColorTag::Default);

        s.toggle_slot(1);
        s.apply_edit(&form(None, "", None));
        // No color chosen at all: untouched.
        s.toggle_slot(0);
        s.apply_edit(&form(None, "", Some(ColorTag::Green)));
        s.toggle_slot(0);
        s.apply_edit(&form(None, "", None));
        assert_eq!(s.grid.get(0).unwrap().color, ColorTag::Green);
    }

    #[test]
    fn non_incrementable_serial_repeats_verbatim() {
        let mut s = small_session();
        s.toggle_slot(0);
        s.toggle_slot(1);
        s.apply_edit(&form(None, "RAW-", None));
        assert_eq!(s.grid.get(0).unwrap().serial, "RAW-");
        assert_eq!(s.grid.get(1).unwrap().serial, "RAW-");
    }

    #[test]
    fn clear_selection_resets_content() {
        let mut s = small_session();
        s.toggle_slot(0);
        s.apply_edit(&form(Some("Ward"), "W01", Some(ColorTag::Blue)));
        s.toggle_slot(0);
        s.clear_selection();
        let slot = s.grid.get(0).unwrap();
        assert!(slot.is_empty());
        assert_eq!(slot.color, ColorTag::Default);
        assert!(!slot.selected);
        assert!(s.targets().is_empty());
    }

    #[test]
    fn clear_all_is_idempotent() {
        let mut s = small_session();
        s.select_all();
        s.apply_edit(&form(Some("Ward"), "W01", Some(ColorTag::Blue)));
        s.toggle_slot(3);
        s.clear_all();
        let snapshot = format!("{:?}", s.grid);
        let targets = s.targets().to_vec();
        s.clear_all();
        assert_eq!(format!("{:?}", s.grid), snapshot);
        assert_eq!(s.targets(), targets.as_slice());
        assert!(s.grid.iter().all(|slot| slot.is_empty() && !slot.selected));
    }

    #[test]
    fn batch_focus_only_in_batch_mode() {
        let mut s = small_session();
        s.toggle_slot(2);
        assert_eq!(s.batch_focus(), None);
        s.set_mode(EditMode::Batch);
        assert_eq!(s.batch_focus(), Some(2));
        s.set_mode(EditMode::Bulk);
        assert_eq!(s.batch_focus(), None);
    }
}
