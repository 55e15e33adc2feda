// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for tandem.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`RafLoop`] and [`IntervalLoop`]: tick sources
//! - [`WebMediaElement`]: `HTMLMediaElement` behind the
//!   [`MediaElement`] seam, with [`PlayRejections`] collecting refused
//!   `play()` promises
//! - [`DomResourceHints`]: `<link rel="preconnect">` and
//!   `<link rel="dns-prefetch">` injection
//! - [`QualityStore`]: quality preference in `localStorage`
//! - [`MediaSessionBridge`]: OS media controls
//! - [`ConsoleSink`]: a [`TraceSink`] writing to the browser console
//! - [`page`]: reading descriptors and configuration from the page

mod console;
mod element;
mod error;
mod hints;
mod media_session;
pub mod page;
mod raf;
mod storage;

pub use console::ConsoleSink;
pub use element::{PlayRejections, WebMediaElement};
pub use error::WebError;
pub use hints::DomResourceHints;
pub use media_session::MediaSessionBridge;
pub use raf::{IntervalLoop, RafLoop};
pub use storage::QualityStore;
pub use tandem_core::media::MediaElement;
pub use tandem_core::trace::TraceSink;
pub use tandem_core::warmer::ResourceHints;

use tandem_core::time::HostTime;

/// Returns the current host time from `performance.now()`.
///
/// The returned [`HostTime`] is in microsecond ticks.
#[must_use]
pub fn now() -> HostTime {
    HostTime::from_millis_f64(raf::performance_now())
}

/// Returns the page's own origin (`location.origin`), if there is a window.
#[must_use]
pub fn page_origin() -> Option<String> {
    web_sys::window()?.location().origin().ok()
}
