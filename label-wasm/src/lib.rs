use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Array;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Blob, BlobPropertyBag, Document, HtmlElement, HtmlInputElement, HtmlSelectElement,
    KeyboardEvent, MouseEvent, Url, Window,
};

mod constants;
mod dom;
mod state;
mod utils;

use constants::{
    EXPORT_PX_PER_IN, PRINT_PX_PER_IN, ZOOM_MAX, ZOOM_MIN, ZOOM_STEP, resolve_title,
};
use label_core::{Calibration, ColorTag, EditForm, EditMode, Session, Slot, export_csv};
use state::{STATE, State};
use utils::{element_by_id, input_by_id, log, save_bytes_as_file, save_text_as_file};

/// Characters escaped in the CSV data URI, mirroring `encodeURI`.
const CSV_ENCODE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Saved sheet payload consumed by the `sheet` CLI renderer.
#[derive(Serialize)]
struct SheetExport<'a> {
    labels: &'a [Slot],
    calibration: Calibration,
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    // Without the grid container there is nothing to drive.
    let Some(container) = element_by_id(&document, "labelContainer") else {
        return Ok(());
    };
    let state = Rc::new(RefCell::new(State {
        window,
        document,
        container,
        session: Session::default(),
        chosen_color: None,
        zoom: 1.0,
    }));
    dom::build_grid(&state)?;
    attach_ui(state.clone())?;
    STATE.with(|s| *s.borrow_mut() = Some(state));
    Ok(())
}

/// Wire every control that exists on the page; missing optional elements
/// are skipped rather than treated as errors.
fn attach_ui(state: Rc<RefCell<State>>) -> Result<(), JsValue> {
    let doc = state.borrow().document.clone();

    // Batch mode toggle
    if let Some(btn) = element_by_id(&doc, "batchToggle") {
        let st = state.clone();
        let btn2 = btn.clone();
        let onclick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let mut s = st.borrow_mut();
            let next = match s.session.mode() {
                EditMode::Bulk => EditMode::Batch,
                EditMode::Batch => EditMode::Bulk,
            };
            s.session.set_mode(next);
            style_batch_toggle(&btn2, next == EditMode::Batch);
            dom::sync_selection(&s);
        }));
        btn.set_onclick(Some(onclick.as_ref().unchecked_ref()));
        onclick.forget();
    }

    // Edit button and keyboard/scanner commit paths
    if let Some(btn) = element_by_id(&doc, "editSelected") {
        let st = state.clone();
        let onclick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            do_edit(&st);
        }));
        btn.set_onclick(Some(onclick.as_ref().unchecked_ref()));
        onclick.forget();
    }
    for id in ["titleInput", "barcodeInput"] {
        if let Some(input) = input_by_id(&doc, id) {
            let st = state.clone();
            let keydown =
                Closure::<dyn FnMut(KeyboardEvent)>::wrap(Box::new(move |e: KeyboardEvent| {
                    if e.key() == "Enter" {
                        e.prevent_default();
                        do_edit(&st);
                    }
                }));
            input.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
            keydown.forget();
        }
    }
    // Scanner hardware commits with a change event, not Enter.
    if let Some(input) = input_by_id(&doc, "barcodeInput") {
        let st = state.clone();
        let onchange = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            do_edit(&st);
        }));
        input.add_event_listener_with_callback("change", onchange.as_ref().unchecked_ref())?;
        onchange.forget();
    }

    // Title dropdown shows the free-text input only for the custom choice
    if let (Some(sel), Some(custom)) = (
        doc.get_element_by_id("titleSelect")
            .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok()),
        input_by_id(&doc, "titleInput"),
    ) {
        let sel_read = sel.clone();
        let onchange = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            if sel_read.value() == "custom" {
                let _ = custom.style().set_property("display", "inline-block");
                let _ = custom.focus();
            } else {
                let _ = custom.style().set_property("display", "none");
                custom.set_value("");
            }
        }));
        sel.add_event_listener_with_callback("change", onchange.as_ref().unchecked_ref())?;
        onchange.forget();
    }

    attach_color_picker(&state, &doc)?;
    attach_selection_buttons(&state, &doc);
    attach_zoom(&state, &doc);
    attach_export(&state, &doc);
    attach_print(&state, &doc)?;
    Ok(())
}

fn attach_selection_buttons(state: &Rc<RefCell<State>>, doc: &Document) {
    if let Some(btn) = element_by_id(doc, "selectAll") {
        let st = state.clone();
        let onclick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let mut s = st.borrow_mut();
            s.session.select_all();
            dom::sync_selection(&s);
        }));
        btn.set_onclick(Some(onclick.as_ref().unchecked_ref()));
        onclick.forget();
    }
    if let Some(btn) = element_by_id(doc, "clearSelection") {
        let st = state.clone();
        let onclick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let mut s = st.borrow_mut();
            let cleared = s.session.targets().to_vec();
            s.session.clear_selection();
            for index in cleared {
                dom::paint_slot(&s, index);
            }
        }));
        btn.set_onclick(Some(onclick.as_ref().unchecked_ref()));
        onclick.forget();
    }
    if let Some(btn) = element_by_id(doc, "clearAll") {
        let st = state.clone();
        let onclick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let mut s = st.borrow_mut();
            s.session.clear_all();
            dom::paint_all(&s);
        }));
        btn.set_onclick(Some(onclick.as_ref().unchecked_ref()));
        onclick.forget();
    }
}

fn attach_zoom(state: &Rc<RefCell<State>>, doc: &Document) {
    for (id, dir) in [("zoomIn", 1.0), ("zoomOut", -1.0)] {
        if let Some(btn) = element_by_id(doc, id) {
            let st = state.clone();
            let onclick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
                let mut s = st.borrow_mut();
                s.zoom = (s.zoom + dir * ZOOM_STEP).clamp(ZOOM_MIN, ZOOM_MAX);
                update_zoom(&s);
            }));
            btn.set_onclick(Some(onclick.as_ref().unchecked_ref()));
            onclick.forget();
        }
    }
}

fn update_zoom(s: &State) {
    let style = s.container.style();
    let _ = style.set_property("transform-origin", "top center");
    let _ = style.set_property("transform", &format!("scale({})", s.zoom));
    if let Some(level) = element_by_id(&s.document, "zoomLevel") {
        level.set_text_content(Some(&format!("{}%", (s.zoom * 100.0).round())));
    }
}

fn attach_export(state: &Rc<RefCell<State>>, doc: &Document) {
    // CSV of all non-empty slots, downloaded through a data URI
    if let Some(btn) = element_by_id(doc, "exportCsv") {
        let st = state.clone();
        let onclick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let s = st.borrow();
            match export_csv(&s.session.grid) {
                Some(csv) => {
                    let _ = download_csv(&s.document, &csv);
                }
                None => {
                    let _ = s.window.alert_with_message("No labels to export.");
                }
            }
        }));
        btn.set_onclick(Some(onclick.as_ref().unchecked_ref()));
        onclick.forget();
    }
    // Labels JSON for the CLI renderer
    if let Some(btn) = element_by_id(doc, "downloadJson") {
        let st = state.clone();
        let onclick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let s = st.borrow();
            let export = SheetExport {
                labels: s.session.grid.slots(),
                calibration: s.session.calibration,
            };
            let json = serde_json::to_string_pretty(&export).unwrap_or_else(|_| "{}".to_string());
            let _ = save_text_as_file(&s.document, "labels.json", &json);
        }));
        btn.set_onclick(Some(onclick.as_ref().unchecked_ref()));
        onclick.forget();
    }
    // Deterministic sheet PNG rendered in the browser
    if let Some(btn) = element_by_id(doc, "exportPng") {
        let st = state.clone();
        let onclick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            if let Err(e) = export_sheet_png(&st.borrow()) {
                log(&format!("sheet PNG export failed: {e:?}"));
            }
        }));
        btn.set_onclick(Some(onclick.as_ref().unchecked_ref()));
        onclick.forget();
    }
}

fn download_csv(document: &Document, csv: &str) -> Result<(), JsValue> {
    let encoded = utf8_percent_encode(csv, CSV_ENCODE).to_string();
    let href = format!("data:text/csv;charset=utf-8,{encoded}");
    let a = document.create_element("a")?.dyn_into::<HtmlElement>()?;
    a.set_attribute("href", &href)?;
    a.set_attribute("download", "labels.csv")?;
    a.click();
    Ok(())
}

fn attach_color_picker(state: &Rc<RefCell<State>>, doc: &Document) -> Result<(), JsValue> {
    let Some(selector) = doc
        .query_selector(".color-selector")?
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    else {
        return Ok(());
    };
    if let Some(selected) = selector
        .query_selector(".color-selected")?
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    {
        selected.set_text_content(Some("Select label Color"));
        let sel2 = selector.clone();
        let onclick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let _ = sel2.class_list().toggle("active");
        }));
        selected.set_onclick(Some(onclick.as_ref().unchecked_ref()));
        onclick.forget();
    }

    let options = selector.query_selector_all(".color-option")?;
    for i in 0..options.length() {
        let Some(option) = options
            .item(i)
            .and_then(|n| n.dyn_into::<HtmlElement>().ok())
        else {
            continue;
        };
        let st = state.clone();
        let sel2 = selector.clone();
        let opt2 = option.clone();
        let onclick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let color = ColorTag::from_name(&opt2.dataset().get("color").unwrap_or_default());
            let mut s = st.borrow_mut();
            s.chosen_color = Some(color);
            if let Some(selected) = sel2
                .query_selector(".color-selected")
                .ok()
                .flatten()
            {
                selected.set_text_content(opt2.text_content().as_deref());
            }
            let _ = sel2.class_list().remove_1("active");
            // Picking a color recolors the current selection immediately.
            let targets = s.session.targets().to_vec();
            for &index in &targets {
                if let Some(slot) = s.session.grid.get_mut(index) {
                    slot.color = color;
                }
            }
            for index in targets {
                dom::paint_slot(&s, index);
            }
        }));
        option.set_onclick(Some(onclick.as_ref().unchecked_ref()));
        onclick.forget();
    }

    // Clicking anywhere else closes the popup.
    let sel2 = selector.clone();
    let onclick = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |e: MouseEvent| {
        let target = e.target().and_then(|t| t.dyn_into::<web_sys::Node>().ok());
        if !sel2.contains(target.as_ref()) {
            let _ = sel2.class_list().remove_1("active");
        }
    }));
    doc.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
    onclick.forget();
    Ok(())
}

/// Apply the form to the current target set and mirror the outcome back
/// into the page: repaint, advance highlight, prepare the next scan.
fn do_edit(state: &Rc<RefCell<State>>) {
    let outcome = {
        let mut s = state.borrow_mut();
        let doc = s.document.clone();
        let choice = doc
            .get_element_by_id("titleSelect")
            .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
            .map(|sel| sel.value())
            .unwrap_or_else(|| "custom".to_string());
        let custom = input_by_id(&doc, "titleInput")
            .map(|i| i.value())
            .unwrap_or_default();
        let serial = input_by_id(&doc, "barcodeInput")
            .map(|i| i.value())
            .unwrap_or_default();
        let form = EditForm {
            title: resolve_title(&choice, &custom),
            serial,
            color: s.chosen_color,
        };
        s.session.apply_edit(&form)
    };
    // An edit with nothing selected is a silent no-op; the form keeps its
    // values so the operator can select first and resubmit.
    if outcome.modified.is_empty() {
        return;
    }
    let s = state.borrow();
    for &index in &outcome.modified {
        dom::paint_slot(&s, index);
    }
    dom::sync_selection(&s);
    if let Some(focus) = outcome.focus {
        dom::scroll_to_slot(&s, focus);
    }
    if let Some(input) = input_by_id(&s.document, "barcodeInput") {
        input.set_value(outcome.serial_input.as_deref().unwrap_or(""));
        schedule_refocus(&s.window, input);
    }
}

/// Re-focus the serial input after the current event's handlers finish, so
/// the scanner's own completion events are not raced.
fn schedule_refocus(window: &Window, input: HtmlInputElement) {
    let cb = Closure::<dyn FnMut()>::wrap(Box::new(move || {
        let _ = input.focus();
    }));
    let _ = window
        .set_timeout_with_callback_and_timeout_and_arguments_0(cb.as_ref().unchecked_ref(), 30);
    cb.forget();
}

fn style_batch_toggle(btn: &HtmlElement, on: bool) {
    let style = btn.style();
    if on {
        let _ = style.set_property("background-color", "#39ff14");
        let _ = style.set_property("color", "#000");
        let _ = style.set_property("border-color", "#39ff14");
        let _ = style.set_property("box-shadow", "0 0 10px #39ff14, 0 0 20px #39ff14");
    } else {
        let _ = style.set_property("background-color", "#f7f9fc");
        let _ = style.set_property("color", "#1f2933");
        let _ = style.set_property("border-color", "#d0d7e2");
        let _ = style.set_property("box-shadow", "none");
    }
}

// ---------------------------------------------------------------------
// Calibration modal & printing
// ---------------------------------------------------------------------

const CALIBRATION_MODAL_HTML: &str = r#"<div class="modal-content">
  <h4>Calibration (Adjust Margins if Needed)</h4>
  <label>Left(-)/Right(+) (X, mm):
    <input type="number" id="modalCalibrationX" value="0" step="0.5">
  </label>
  <label>Up(-)/Down(+) (Y, mm):
    <input type="number" id="modalCalibrationY" value="0" step="0.5">
  </label>
  <div class="modal-actions">
    <button id="modalApplyCalibration">Print</button>
    <button id="modalResetCalibration">Reset</button>
    <button id="modalCloseCalibration">Close</button>
  </div>
</div>"#;

fn attach_print(state: &Rc<RefCell<State>>, doc: &Document) -> Result<(), JsValue> {
    let Some(print_btn) = element_by_id(doc, "printPDF") else {
        return Ok(());
    };
    let modal = ensure_calibration_modal(doc)?;

    {
        let st = state.clone();
        let modal2 = modal.clone();
        let onclick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let s = st.borrow();
            let cal = s.session.calibration;
            if let Some(x) = input_by_id(&s.document, "modalCalibrationX") {
                x.set_value(&format!("{:.1}", cal.x_mm));
            }
            if let Some(y) = input_by_id(&s.document, "modalCalibrationY") {
                y.set_value(&format!("{:.1}", cal.y_mm));
            }
            let _ = modal2.style().set_property("display", "flex");
        }));
        print_btn.set_onclick(Some(onclick.as_ref().unchecked_ref()));
        onclick.forget();
    }

    if let Some(apply) = element_by_id(doc, "modalApplyCalibration") {
        let st = state.clone();
        let modal2 = modal.clone();
        let onclick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let mut s = st.borrow_mut();
            let x = input_by_id(&s.document, "modalCalibrationX")
                .map(|i| i.value())
                .unwrap_or_default();
            let y = input_by_id(&s.document, "modalCalibrationY")
                .map(|i| i.value())
                .unwrap_or_default();
            s.session.calibration = Calibration::from_inputs(&x, &y);
            let _ = modal2.style().set_property("display", "none");
            if let Err(e) = print_sheet(&s) {
                log(&format!("print failed: {e:?}"));
            }
        }));
        apply.set_onclick(Some(onclick.as_ref().unchecked_ref()));
        onclick.forget();
    }

    if let Some(reset) = element_by_id(doc, "modalResetCalibration") {
        let st = state.clone();
        let onclick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let mut s = st.borrow_mut();
            s.session.calibration.reset();
            if let Some(x) = input_by_id(&s.document, "modalCalibrationX") {
                x.set_value("0");
            }
            if let Some(y) = input_by_id(&s.document, "modalCalibrationY") {
                y.set_value("0");
            }
            let _ = s.window.alert_with_message("Calibration reset to 0 mm");
        }));
        reset.set_onclick(Some(onclick.as_ref().unchecked_ref()));
        onclick.forget();
    }

    if let Some(close) = element_by_id(doc, "modalCloseCalibration") {
        let modal2 = modal.clone();
        let onclick = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            let _ = modal2.style().set_property("display", "none");
        }));
        close.set_onclick(Some(onclick.as_ref().unchecked_ref()));
        onclick.forget();
    }
    Ok(())
}

fn ensure_calibration_modal(doc: &Document) -> Result<HtmlElement, JsValue> {
    if let Some(existing) = element_by_id(doc, "calibrationModal") {
        return Ok(existing);
    }
    let modal = doc.create_element("div")?.dyn_into::<HtmlElement>()?;
    modal.set_id("calibrationModal");
    modal.set_inner_html(CALIBRATION_MODAL_HTML);
    let _ = modal.style().set_property("display", "none");
    if let Some(body) = doc.body() {
        body.append_child(&modal)?;
    }
    Ok(modal)
}

/// Hand the sheet to the print subsystem: a self-contained document in a
/// new window that prints itself once loaded.
fn print_sheet(s: &State) -> Result<(), JsValue> {
    let (svg, _, _) = sheet_core::build_sheet_svg(
        s.session.grid.slots(),
        s.session.calibration,
        PRINT_PX_PER_IN,
    );
    let html = format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><style>\
         @page {{ size: letter; margin: 0; }} body {{ margin: 0; }}\
         @font-face {{ font-family: 'Libre Barcode 39'; \
         src: url('LibreBarcode39-Regular.ttf') format('truetype'); }}\
         svg {{ display: block; width: 8.5in; height: 11in; }}\
         </style></head><body>{svg}<script>\
         window.addEventListener('load', () => {{ \
         window.onafterprint = () => window.close(); window.print(); }});\
         </script></body></html>"
    );
    let array = Array::new();
    array.push(&JsValue::from_str(&html));
    let props = BlobPropertyBag::new();
    props.set_type("text/html");
    let blob = Blob::new_with_str_sequence_and_options(&array, &props)?;
    let url = Url::create_object_url_with_blob(&blob)?;
    match s.window.open_with_url_and_target(&url, "_blank")? {
        Some(win) => {
            // The URL must stay alive until the print document has loaded.
            let onload = Closure::<dyn FnMut()>::wrap(Box::new(move || {
                let _ = Url::revoke_object_url(&url);
            }));
            win.set_onload(Some(onload.as_ref().unchecked_ref()));
            onload.forget();
        }
        None => {
            let _ = Url::revoke_object_url(&url);
            s.window
                .alert_with_message("Print window was blocked by the browser")?;
        }
    }
    Ok(())
}

/// Render the sheet to a PNG in the browser with the embedded fonts, so the
/// download matches the CLI renderer byte for byte.
fn export_sheet_png(s: &State) -> Result<(), JsValue> {
    if fonts::TEXT_FONT_BYTES.is_empty() || fonts::BARCODE_FONT_BYTES.is_empty() {
        s.window
            .alert_with_message("Embedded fonts are missing; PNG export is unavailable.")?;
        return Ok(());
    }
    let (svg, w_px, h_px) = sheet_core::build_sheet_svg(
        s.session.grid.slots(),
        s.session.calibration,
        EXPORT_PX_PER_IN,
    );
    let mut fontdb = usvg::fontdb::Database::new();
    fontdb.load_font_data(fonts::TEXT_FONT_BYTES.to_vec());
    fontdb.load_font_data(fonts::BARCODE_FONT_BYTES.to_vec());
    fontdb.set_sans_serif_family("DejaVu Sans");
    let mut opt = usvg::Options::default();
    opt.fontdb = std::sync::Arc::new(fontdb);
    let tree = usvg::Tree::from_str(&svg, &opt)
        .map_err(|e| JsValue::from_str(&format!("SVG parse error: {e:?}")))?;
    let mut pixmap = tiny_skia::Pixmap::new(w_px, h_px)
        .ok_or_else(|| JsValue::from_str("pixmap alloc failed"))?;
    let mut pm = pixmap.as_mut();
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pm);
    let bytes = sheet_core::encode_rgba_to_png_bytes(w_px, h_px, pixmap.data())
        .map_err(|e| JsValue::from_str(&format!("PNG encode error: {e:?}")))?;
    save_bytes_as_file(&s.document, "label-sheet.png", &bytes, "image/png")
}
