// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Connection warming for media origins.

use std::collections::HashSet;

use url::Url;

/// Emits connection hints to the platform.
///
/// On the web this appends `<link rel="preconnect">` and
/// `<link rel="dns-prefetch">` elements to the document head.
pub trait ResourceHints {
    /// Asks the platform to open a connection to `origin` ahead of use.
    fn preconnect(&mut self, origin: &str);

    /// Asks the platform to resolve `origin`'s host ahead of use.
    fn dns_prefetch(&mut self, origin: &str);
}

/// Hints each distinct origin once per page lifetime.
#[derive(Debug)]
pub struct ConnectionWarmer<H> {
    hints: H,
    warmed: HashSet<String>,
}

impl<H: ResourceHints> ConnectionWarmer<H> {
    /// Wraps a hint emitter.
    #[must_use]
    pub fn new(hints: H) -> Self {
        Self {
            hints,
            warmed: HashSet::new(),
        }
    }

    /// Warms the origin of `url`.
    ///
    /// Returns the origin if hints were emitted, `None` if it was already
    /// warm or `url` has no network origin. Malformed input is ignored.
    pub fn warm(&mut self, url: &str) -> Option<String> {
        let origin = origin_of(url)?;
        if !self.warmed.insert(origin.clone()) {
            return None;
        }
        self.hints.preconnect(&origin);
        self.hints.dns_prefetch(&origin);
        Some(origin)
    }

    /// Whether `origin` has been warmed.
    #[must_use]
    pub fn is_warm(&self, origin: &str) -> bool {
        self.warmed.contains(origin)
    }

    /// The underlying hint emitter.
    #[must_use]
    pub fn hints(&self) -> &H {
        &self.hints
    }
}

fn origin_of(url: &str) -> Option<String> {
    let origin = Url::parse(url).ok()?.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log(Vec<String>);

    impl ResourceHints for Log {
        fn preconnect(&mut self, origin: &str) {
            self.0.push(format!("preconnect {origin}"));
        }

        fn dns_prefetch(&mut self, origin: &str) {
            self.0.push(format!("dns-prefetch {origin}"));
        }
    }

    #[test]
    fn each_origin_is_warmed_once() {
        let mut warmer = ConnectionWarmer::new(Log::default());
        assert_eq!(
            warmer.warm("https://rr1.example.com/videoplayback?a=1").as_deref(),
            Some("https://rr1.example.com")
        );
        assert_eq!(warmer.warm("https://rr1.example.com/other"), None);
        assert!(warmer.warm("https://rr2.example.com:8443/x").is_some());
        assert_eq!(
            warmer.hints().0,
            [
                "preconnect https://rr1.example.com",
                "dns-prefetch https://rr1.example.com",
                "preconnect https://rr2.example.com:8443",
                "dns-prefetch https://rr2.example.com:8443",
            ]
        );
        assert!(warmer.is_warm("https://rr1.example.com"));
    }

    #[test]
    fn malformed_urls_are_ignored() {
        let mut warmer = ConnectionWarmer::new(Log::default());
        assert_eq!(warmer.warm("/relative"), None);
        assert_eq!(warmer.warm("data:video/mp4;base64,AAAA"), None);
        assert!(warmer.hints().0.is_empty());
    }
}
