// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlLinkElement};

use tandem_core::warmer::ResourceHints;

/// Attributes of one kind of hint `<link>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct HintLink {
    rel: &'static str,
    cross_origin: Option<&'static str>,
}

// Media elements fetch in credentialed no-cors mode and only reuse a
// preconnected socket opened the same way, so no `crossorigin` here.
const PRECONNECT: HintLink = HintLink {
    rel: "preconnect",
    cross_origin: None,
};

const DNS_PREFETCH: HintLink = HintLink {
    rel: "dns-prefetch",
    cross_origin: None,
};

/// Emits connection hints as `<link>` elements in the document head.
#[derive(Debug)]
pub struct DomResourceHints {
    document: Document,
}

impl DomResourceHints {
    /// Appends hints to `document`'s head.
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    fn append(&self, hint: HintLink, origin: &str) {
        let Some(head) = self.document.head() else {
            return;
        };
        let Ok(link) = self.document.create_element("link") else {
            return;
        };
        let Ok(link) = link.dyn_into::<HtmlLinkElement>() else {
            return;
        };
        link.set_rel(hint.rel);
        link.set_href(origin);
        if hint.cross_origin.is_some() {
            link.set_cross_origin(hint.cross_origin);
        }
        _ = head.append_child(&link);
    }
}

impl ResourceHints for DomResourceHints {
    fn preconnect(&mut self, origin: &str) {
        self.append(PRECONNECT, origin);
    }

    fn dns_prefetch(&mut self, origin: &str) {
        self.append(DNS_PREFETCH, origin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_hints_match_no_cors_fetches() {
        assert_eq!(PRECONNECT.rel, "preconnect");
        assert_eq!(DNS_PREFETCH.rel, "dns-prefetch");
        assert_eq!(PRECONNECT.cross_origin, None);
        assert_eq!(DNS_PREFETCH.cross_origin, None);
    }
}
