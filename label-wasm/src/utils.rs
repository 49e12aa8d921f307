use js_sys::Array;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, Document, HtmlElement, HtmlInputElement, Url};

/// Log a message to the browser console.
pub fn log(s: &str) {
    web_sys::console::log_1(&JsValue::from_str(s));
}

/// Look up an input element by id; absent or mistyped elements yield `None`
/// so page variants without the control are simply skipped.
pub fn input_by_id(document: &Document, id: &str) -> Option<HtmlInputElement> {
    document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
}

pub fn element_by_id(document: &Document, id: &str) -> Option<HtmlElement> {
    document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
}

/// Trigger a client-side download of a text file through a temporary
/// object URL.
pub fn save_text_as_file(document: &Document, filename: &str, text: &str) -> Result<(), JsValue> {
    let array = Array::new();
    array.push(&JsValue::from_str(text));
    let blob = Blob::new_with_str_sequence(&array)?;
    download_blob(document, filename, &blob)
}

/// Same, for binary payloads (the sheet PNG export).
pub fn save_bytes_as_file(
    document: &Document,
    filename: &str,
    bytes: &[u8],
    mime: &str,
) -> Result<(), JsValue> {
    let u8 = js_sys::Uint8Array::from(bytes);
    let array = Array::new();
    array.push(&u8.buffer());
    let props = BlobPropertyBag::new();
    props.set_type(mime);
    let blob = Blob::new_with_buffer_source_sequence_and_options(&array, &props)?;
    download_blob(document, filename, &blob)
}

fn download_blob(document: &Document, filename: &str, blob: &Blob) -> Result<(), JsValue> {
    let url = Url::create_object_url_with_blob(blob)?;
    let a = document.create_element("a")?.dyn_into::<HtmlElement>()?;
    a.set_attribute("href", &url)?;
    a.set_attribute("download", filename)?;
    a.click();
    Url::revoke_object_url(&url)?;
    Ok(())
}
