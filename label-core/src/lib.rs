//! Editing core for the label sheet tool: the slot grid, the serial
//! sequencer and the selection/batch-edit session state machine.
//!
//! Everything here is DOM-free and synchronous so the front end (or the CLI)
//! can drive it and paint the result afterwards.

pub mod export;
pub mod serial;
pub mod session;
pub mod slots;

pub use export::export_csv;
pub use serial::SerialSpec;
pub use session::{EditForm, EditMode, EditOutcome, Session};
pub use slots::{Calibration, ColorTag, Slot, SlotGrid};

/// Default grid shape: one US letter page worth of labels.
pub const GRID_ROWS: usize = 15;
pub const GRID_COLS: usize = 4;
