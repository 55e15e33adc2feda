// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use wasm_bindgen::JsValue;

/// Failures while wiring the controller to the page.
///
/// These only occur during setup. Once the controller runs, failures are
/// absorbed and reported through the trace sink.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// No global `window` (not running in a browser main thread).
    #[error("no global window")]
    NoWindow,
    /// The window has no document.
    #[error("no document")]
    NoDocument,
    /// A required element is absent.
    #[error("element `#{0}` not found")]
    MissingElement(String),
    /// An element exists but has the wrong type.
    #[error("element `#{0}` is not a {1}")]
    WrongElementType(String, &'static str),
    /// A JavaScript exception, stringified.
    #[error("javascript error: {0}")]
    Js(String),
    /// Page data did not decode.
    #[error("malformed page data: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<JsValue> for WebError {
    fn from(value: JsValue) -> Self {
        Self::Js(describe(&value))
    }
}

impl From<WebError> for JsValue {
    fn from(err: WebError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}

/// Renders a thrown JS value for diagnostics: `name: message` for errors,
/// the string itself for strings, `Debug` otherwise.
pub(crate) fn describe(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    let field = |key: &str| {
        js_sys::Reflect::get(value, &JsValue::from_str(key))
            .ok()
            .and_then(|v| v.as_string())
    };
    match (field("name"), field("message")) {
        (Some(name), Some(message)) => format!("{name}: {message}"),
        (Some(name), None) => name,
        (None, Some(message)) => message,
        (None, None) => format!("{value:?}"),
    }
}

/// The `name` property of a thrown DOM exception, if any.
pub(crate) fn error_name(value: &JsValue) -> Option<String> {
    js_sys::Reflect::get(value, &JsValue::from_str("name"))
        .ok()
        .and_then(|v| v.as_string())
}
