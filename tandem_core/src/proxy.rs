// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Origin rewriting and per-stream proxy state.
//!
//! When the upstream content-delivery network rejects a stream (the element
//! reports an unsupported or aborted source), the loader retries through the
//! local proxy instance. [`RewriteRule`] produces the proxied URL and
//! [`ProxyTable`] remembers which logical streams have been proxied. Once
//! marked, a stream stays proxied for the rest of the session.

use std::collections::HashSet;

use serde::Deserialize;
use url::Url;

use crate::error::RewriteError;
use crate::format::{StreamKey, Track};

/// Settings for the origin-rewrite rule, as read from page configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Domain (and its subdomains) served by the upstream CDN.
    pub upstream_domain: String,
    /// Origin of the local proxy. `None` means the page's own origin.
    pub proxy_origin: Option<String>,
    /// Query parameter naming the original host; stripped on rewrite.
    pub host_param: String,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            upstream_domain: "googlevideo.com".into(),
            proxy_origin: None,
            host_param: "host".into(),
        }
    }
}

/// Maps upstream media URLs onto the proxy instance's origin.
#[derive(Clone, Debug)]
pub struct RewriteRule {
    upstream_domain: String,
    proxy: Url,
    host_param: String,
}

impl RewriteRule {
    /// Builds a rule from configuration, using `page_origin` when the
    /// configuration names no explicit proxy origin.
    pub fn new(config: &RewriteConfig, page_origin: &str) -> Result<Self, RewriteError> {
        let origin = config.proxy_origin.as_deref().unwrap_or(page_origin);
        let proxy = Url::parse(origin)
            .ok()
            .filter(|u| u.host_str().is_some())
            .ok_or_else(|| RewriteError::InvalidProxyOrigin(origin.to_owned()))?;
        Ok(Self {
            upstream_domain: config.upstream_domain.to_ascii_lowercase(),
            proxy,
            host_param: config.host_param.clone(),
        })
    }

    /// Whether `host` belongs to the upstream domain.
    fn is_upstream(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        host == self.upstream_domain
            || host
                .strip_suffix(&self.upstream_domain)
                .is_some_and(|rest| rest.ends_with('.'))
    }

    /// Rewrites an upstream URL onto the proxy origin.
    ///
    /// Scheme, host and port come from the proxy; path, the remaining query
    /// and the fragment are kept. The original-host query parameter is
    /// removed. URLs on any other host, and unparseable input, are returned
    /// unchanged.
    #[must_use]
    pub fn rewrite(&self, raw: &str) -> String {
        let Ok(mut url) = Url::parse(raw) else {
            return raw.to_owned();
        };
        if !url.host_str().is_some_and(|h| self.is_upstream(h)) {
            return raw.to_owned();
        }

        let kept = url.query().map(|query| self.strip_host_param(query));

        if url.set_scheme(self.proxy.scheme()).is_err()
            || url.set_host(self.proxy.host_str()).is_err()
            || url.set_port(self.proxy.port()).is_err()
        {
            return raw.to_owned();
        }
        if let Some(kept) = kept {
            url.set_query((!kept.is_empty()).then_some(kept.as_str()));
        }
        url.into()
    }

    /// Drops the original-host parameter from a raw query string.
    ///
    /// Remaining segments keep their exact bytes.
    fn strip_host_param(&self, query: &str) -> String {
        query
            .split('&')
            .filter(|segment| {
                let key = segment.split_once('=').map_or(*segment, |(k, _)| k);
                key != self.host_param
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Whether rewriting `raw` would change it.
    #[must_use]
    pub fn applies_to(&self, raw: &str) -> bool {
        Url::parse(raw)
            .ok()
            .and_then(|u| u.host_str().map(|h| self.is_upstream(h)))
            .unwrap_or(false)
    }
}

/// Which logical streams have been moved onto the proxy.
///
/// Marks are never cleared within a session.
#[derive(Clone, Debug, Default)]
pub struct ProxyTable {
    proxied: HashSet<StreamKey>,
}

impl ProxyTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `key` must be loaded through the proxy from now on.
    /// Returns `true` if the stream was not marked before.
    pub fn mark(&mut self, key: StreamKey) -> bool {
        self.proxied.insert(key)
    }

    /// Whether `key` has been proxied.
    #[must_use]
    pub fn is_proxied(&self, key: &StreamKey) -> bool {
        self.proxied.contains(key)
    }

    /// Whether any stream on `track` has been proxied.
    #[must_use]
    pub fn any_on(&self, track: Track) -> bool {
        self.proxied.iter().any(|k| k.track == track)
    }

    /// Returns the URL a (re)load of `key` must use.
    #[must_use]
    pub fn resolve(&self, key: &StreamKey, url: &str, rule: &RewriteRule) -> String {
        if self.is_proxied(key) {
            rule.rewrite(url)
        } else {
            url.to_owned()
        }
    }
}
