// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Audio track selection.
//!
//! Upstream audio is frequently multi-language, and dubbed tracks are often
//! encoded at a higher bitrate than the original. [`select_best_audio`]
//! therefore ranks in three tiers, each considering only candidates whose
//! URL parses as an absolute URL:
//!
//! 1. English original audio, highest bitrate.
//! 2. Any English audio, highest bitrate.
//! 3. Anything, highest bitrate.
//!
//! Ties keep the first maximum in pool order.

use crate::format::StreamFormat;

/// Returns the best independent audio track, or `None` if no candidate has
/// a valid URL.
#[must_use]
pub fn select_best_audio(pool: &[StreamFormat]) -> Option<&StreamFormat> {
    let valid = || pool.iter().filter(|f| f.has_valid_url());

    max_bitrate(valid().filter(|f| {
        let tags = f.audio_tags();
        tags.is_english() && tags.is_original()
    }))
    .or_else(|| max_bitrate(valid().filter(|f| f.audio_tags().is_english())))
    .or_else(|| max_bitrate(valid()))
}

fn max_bitrate<'a>(candidates: impl Iterator<Item = &'a StreamFormat>) -> Option<&'a StreamFormat> {
    candidates.fold(None, |best: Option<&StreamFormat>, f| match best {
        Some(b) if f.bitrate() <= b.bitrate() => Some(b),
        _ => Some(f),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{FormatCatalog, FormatDescriptor, FormatId};

    fn audio(id: &str, url: Option<&str>, bitrate: u64) -> FormatDescriptor {
        FormatDescriptor {
            id: FormatId::new(id),
            mime_type: r#"audio/webm; codecs="opus""#.into(),
            url: url.map(Into::into),
            bitrate: Some(bitrate),
            quality_label: None,
            height: None,
            resolution: None,
        }
    }

    fn pick(pool: &[StreamFormat]) -> Option<&str> {
        select_best_audio(pool).map(|f| f.id().as_str())
    }

    #[test]
    fn original_english_beats_louder_dubs() {
        let catalog = FormatCatalog::classify([
            audio("a", Some("https://h/v?xtags=lang=en-US:acont=original"), 128),
            audio("b", Some("https://h/v?xtags=lang=en:acont=dubbed"), 256),
            audio("c", Some("https://h/v?xtags=lang=fr:acont=original"), 320),
        ]);
        assert_eq!(pick(catalog.audio_pool()), Some("a"));
    }

    #[test]
    fn any_english_when_no_original() {
        let catalog = FormatCatalog::classify([
            audio("b", Some("https://h/v?xtags=lang=en:acont=dubbed"), 256),
            audio("b2", Some("https://h/v?xtags=lang=en-GB:acont=dubbed"), 192),
            audio("c", Some("https://h/v?xtags=lang=fr:acont=original"), 320),
        ]);
        assert_eq!(pick(catalog.audio_pool()), Some("b"));
    }

    #[test]
    fn highest_bitrate_without_english() {
        let catalog = FormatCatalog::classify([
            audio("de", Some("https://h/v?xtags=lang=de:acont=original"), 128),
            audio("fr", Some("https://h/v?xtags=lang=fr:acont=original"), 320),
            audio("plain", Some("https://h/v"), 160),
        ]);
        assert_eq!(pick(catalog.audio_pool()), Some("fr"));
    }

    #[test]
    fn invalid_urls_are_skipped() {
        let catalog = FormatCatalog::classify([
            audio("broken", Some("/relative/path?xtags=lang=en:acont=original"), 999),
            audio("missing", None, 999),
            audio("ok", Some("https://h/v?xtags=lang=ja"), 64),
        ]);
        assert_eq!(pick(catalog.audio_pool()), Some("ok"));
    }

    #[test]
    fn none_when_nothing_is_valid() {
        let catalog = FormatCatalog::classify([audio("missing", None, 128)]);
        assert_eq!(pick(catalog.audio_pool()), None);
        assert_eq!(pick(&[]), None);
    }

    #[test]
    fn ties_keep_first_maximum() {
        let catalog = FormatCatalog::classify([
            audio("first", Some("https://h/1"), 128),
            audio("second", Some("https://h/2"), 128),
        ]);
        assert_eq!(pick(catalog.audio_pool()), Some("first"));
    }
}
