// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reading the watch page.
//!
//! The server renders the format descriptors as a global `data` object and
//! the initial stream as a `<source>` child of the video element, tagged
//! with `data-itag`. Optional configuration sits as JSON in the video's
//! `data-player-config` attribute.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlMediaElement};

use tandem_core::config::PlayerConfig;
use tandem_core::format::{FormatCatalog, FormatId, PageFormats};

use crate::error::WebError;

/// Name of the global holding the format descriptors.
pub const DATA_GLOBAL: &str = "data";
/// Attribute naming the initially rendered video format.
pub const INITIAL_FORMAT_ATTR: &str = "data-itag";
/// Attribute holding the configuration JSON.
pub const CONFIG_ATTR: &str = "data-player-config";
/// Attribute marking a clickable timestamp.
pub const TIMESTAMP_ATTR: &str = "data-clickable-timestamp";

/// Looks up `#id` and casts it to `T`.
pub fn element_by_id<T: JsCast>(document: &Document, id: &str) -> Result<T, WebError> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| WebError::MissingElement(id.to_owned()))?
        .dyn_into::<T>()
        .map_err(|_| WebError::WrongElementType(id.to_owned(), core::any::type_name::<T>()))
}

/// Decodes the global descriptor object.
///
/// A missing global yields an empty set.
pub fn read_page_formats() -> Result<PageFormats, WebError> {
    let global = js_sys::global();
    let data = js_sys::Reflect::get(&global, &JsValue::from_str(DATA_GLOBAL))?;
    if data.is_undefined() || data.is_null() {
        return Ok(PageFormats::default());
    }
    let json = js_sys::JSON::stringify(&data)?;
    let json = json.as_string().unwrap_or_default();
    Ok(serde_json::from_str(&json)?)
}

/// Decodes `data-player-config`, defaulting when absent.
pub fn read_player_config(video: &Element) -> Result<PlayerConfig, WebError> {
    match video.get_attribute(CONFIG_ATTR) {
        Some(json) if !json.trim().is_empty() => Ok(serde_json::from_str(&json)?),
        _ => Ok(PlayerConfig::default()),
    }
}

/// The initially rendered format and the `<source>` URL the page resolved
/// for it.
#[must_use]
pub fn initial_source(video: &HtmlMediaElement) -> (Option<FormatId>, Option<String>) {
    let id = video
        .get_attribute(INITIAL_FORMAT_ATTR)
        .filter(|s| !s.is_empty())
        .map(FormatId::new);
    let src = video
        .query_selector("source")
        .ok()
        .flatten()
        .and_then(|source| source.get_attribute("src"))
        .filter(|s| !s.is_empty())
        .map(|src| absolutize(&src));
    (id, src)
}

/// Builds the catalog from page data and patches the initial format's URL.
pub fn read_catalog(video: &HtmlMediaElement) -> Result<(FormatCatalog, Option<FormatId>), WebError> {
    let mut catalog = read_page_formats()?.into_catalog();
    let (initial, src) = initial_source(video);
    if let (Some(id), Some(src)) = (&initial, src) {
        catalog.patch_video_url(id, &src);
    }
    Ok((catalog, initial))
}

/// The document's current address.
#[must_use]
pub fn current_address() -> String {
    web_sys::window()
        .and_then(|w| w.location().href().ok())
        .unwrap_or_default()
}

/// Replaces the visible address without navigating.
pub fn replace_address(address: &str) -> Result<(), WebError> {
    let window = web_sys::window().ok_or(WebError::NoWindow)?;
    window
        .history()?
        .replace_state_with_url(&JsValue::NULL, "", Some(address))?;
    Ok(())
}

fn absolutize(src: &str) -> String {
    let base = current_address();
    url::Url::parse(&base)
        .and_then(|b| b.join(src))
        .map_or_else(|_| src.to_owned(), String::from)
}
