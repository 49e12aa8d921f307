//! DOM construction and repainting of the label grid. All slot content
//! lives in `label_core`; this module only mirrors it into elements.

use std::rc::Rc;
use std::cell::RefCell;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use label_core::{ColorTag, Slot};

use crate::state::State;

/// CSS background for a slot, matching the printed band stack: blue fills
/// the upper half on its own, other colors get a blue cap band above their
/// own band.
pub fn css_background(color: ColorTag) -> String {
    match color.hex() {
        None => "white".to_string(),
        Some(hex) if color == ColorTag::Blue => format!(
            "linear-gradient(to bottom, {hex} 0%, {hex} 50%, white 50%, white 100%)"
        ),
        Some(hex) => format!(
            "linear-gradient(to bottom, #0000FF 0%, #0000FF 25%, {hex} 25%, {hex} 50%, white 50%, white 100%)"
        ),
    }
}

/// Build one DOM element per slot inside `#labelContainer`, wiring the
/// click-to-toggle selection handler.
pub fn build_grid(state: &Rc<RefCell<State>>) -> Result<(), JsValue> {
    let (document, container, total) = {
        let s = state.borrow();
        (s.document.clone(), s.container.clone(), s.session.grid.len())
    };
    container.set_inner_html("");
    for index in 0..total {
        let label = document.create_element("div")?.dyn_into::<HtmlElement>()?;
        label.set_class_name("label");
        label.dataset().set("index", &index.to_string())?;
        label.dataset().set("color", ColorTag::Default.name())?;

        let inner = document.create_element("div")?;
        inner.set_class_name("label-inner");

        let index_tag = document.create_element("div")?;
        index_tag.set_class_name("label-index");
        index_tag.set_text_content(Some(&(index + 1).to_string()));

        let title = document.create_element("div")?;
        title.set_class_name("label-title");
        let barcode = document.create_element("div")?;
        barcode.set_class_name("label-barcode");
        let subtitle = document.create_element("div")?;
        subtitle.set_class_name("label-subtitle");

        inner.append_child(&index_tag)?;
        inner.append_child(&title)?;
        inner.append_child(&barcode)?;
        inner.append_child(&subtitle)?;
        label.append_child(&inner)?;

        let st = state.clone();
        let onclick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let mut s = st.borrow_mut();
            s.session.toggle_slot(index);
            sync_selection(&s);
        }));
        label.set_onclick(Some(onclick.as_ref().unchecked_ref()));
        onclick.forget();

        container.append_child(&label)?;
    }
    Ok(())
}

fn find_part(label: &HtmlElement, class: &str) -> Option<HtmlElement> {
    label
        .query_selector(&format!(".{class}"))
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
}

fn slot_element(state: &State, index: usize) -> Option<HtmlElement> {
    state
        .container
        .children()
        .item(index as u32)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
}

/// Mirror one slot's content into its element: title, barcode line,
/// subtitle, background bands and title contrast color.
pub fn paint_slot(state: &State, index: usize) {
    let Some(slot) = state.session.grid.get(index) else {
        return;
    };
    let Some(label) = slot_element(state, index) else {
        return;
    };
    let _ = label.dataset().set("color", slot.color.name());
    let _ = label
        .style()
        .set_property("background", &css_background(slot.color));

    if let Some(title) = find_part(&label, "label-title") {
        title.set_text_content(Some(&slot.title));
        let _ = title.style().set_property("color", slot.color.title_text());
    }
    if let Some(barcode) = find_part(&label, "label-barcode") {
        barcode.set_inner_html("");
        if let Some(text) = slot.barcode_text() {
            if let Ok(span) = state.document.create_element("span") {
                span.set_class_name("barcode-line");
                span.set_text_content(Some(&text));
                let _ = barcode.append_child(&span);
            }
        }
    }
    if let Some(subtitle) = find_part(&label, "label-subtitle") {
        subtitle.set_text_content(Some(&slot.serial));
    }
    sync_slot_selection(state, slot, &label);
}

/// Update selection and batch-focus classes across the whole grid.
pub fn sync_selection(state: &State) {
    for index in 0..state.session.grid.len() {
        if let (Some(slot), Some(label)) = (state.session.grid.get(index), slot_element(state, index))
        {
            sync_slot_selection(state, slot, &label);
        }
    }
}

fn sync_slot_selection(state: &State, slot: &Slot, label: &HtmlElement) {
    let classes = label.class_list();
    set_class(&classes, "selected", slot.selected);
    set_class(
        &classes,
        "batch-focus",
        state.session.batch_focus() == Some(slot.index),
    );
}

fn set_class(classes: &web_sys::DomTokenList, name: &str, on: bool) {
    let _ = if on {
        classes.add_1(name)
    } else {
        classes.remove_1(name)
    };
}

/// Smooth-scroll the batch-focused slot into view.
pub fn scroll_to_slot(state: &State, index: usize) {
    if let Some(label) = slot_element(state, index) {
        let opts = web_sys::ScrollIntoViewOptions::new();
        opts.set_behavior(web_sys::ScrollBehavior::Smooth);
        opts.set_block(web_sys::ScrollLogicalPosition::Center);
        label.scroll_into_view_with_scroll_into_view_options(&opts);
    }
}

/// Repaint every slot; used after bulk clears.
pub fn paint_all(state: &State) {
    for index in 0..state.session.grid.len() {
        paint_slot(state, index);
    }
}
