use std::cell::RefCell;
use std::rc::Rc;

use web_sys::{Document, HtmlElement, Window};

use label_core::{ColorTag, Session};

/// Global application state stored behind an `Rc<RefCell<_>>` so it can be
/// shared across the WASM callbacks.
pub struct State {
    pub window: Window,
    pub document: Document,
    /// The `#labelContainer` element holding one child per slot.
    pub container: HtmlElement,
    /// The editing session: grid, target set, mode, calibration.
    pub session: Session,
    /// Color currently picked in the popup; `None` until the operator
    /// chooses one, `Some(Default)` after an explicit "no color".
    pub chosen_color: Option<ColorTag>,
    pub zoom: f64,
}

/// Thread local storage for the single runtime state instance.
thread_local! {
    pub static STATE: RefCell<Option<Rc<RefCell<State>>>> = const { RefCell::new(None) };
}
