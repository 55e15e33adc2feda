// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stream formats and the format catalog.
//!
//! The host page embeds two flat lists of pre-resolved streams: combined
//! (muxed audio + video) and adaptive (one elementary stream each). Both are
//! decoded into [`FormatDescriptor`]s and partitioned by
//! [`FormatCatalog::classify`]: every entry whose MIME type begins with
//! `video` is keyed by its identifier (last duplicate wins), everything else
//! lands in an unordered audio pool.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer};

use crate::error::{CatalogError, DescriptorError};

/// Codec tokens whose presence in a MIME type marks a muxed audio track.
const AUDIO_CODEC_TOKENS: &[&str] = &["mp4a", "opus", "vorbis", "ac-3", "ec-3", "audio"];

/// Quality identifier of a stream (the upstream `itag`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormatId(pub String);

impl FormatId {
    /// Creates an identifier from anything string-like.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FormatId({})", self.0)
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One of the two playback elements the controller drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Track {
    /// The visible element; the timing master.
    Video,
    /// The hidden element carrying a separate audio stream; the slave.
    Audio,
}

impl Track {
    /// Returns a short lowercase label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

/// What a stream carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// A video stream. `muxed_audio` is true for combined (progressive)
    /// formats that need no separate audio track.
    Video {
        /// Whether the stream's codecs include an audio codec.
        muxed_audio: bool,
    },
    /// An audio-only adaptive stream.
    Audio,
}

impl MediaKind {
    /// Returns the element this kind of stream plays on.
    #[must_use]
    pub const fn track(self) -> Track {
        match self {
            Self::Video { .. } => Track::Video,
            Self::Audio => Track::Audio,
        }
    }
}

/// Logical identity of a stream across reloads: its element and identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StreamKey {
    /// The element the stream plays on.
    pub track: Track,
    /// The stream's quality identifier.
    pub id: FormatId,
}

/// Language and content tags carried in an audio URL's `xtags` parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioTags {
    /// Primary language subtag (`en-US` is normalized to `en`), or
    /// `"unknown"`.
    pub language: String,
    /// Audio content type (`original`, `dubbed`, ...), or `"unknown"`.
    pub content: String,
}

impl AudioTags {
    const UNKNOWN: &'static str = "unknown";

    /// Extracts tags from a URL of the form `...?xtags=lang=en-US:acont=original`.
    ///
    /// Missing, malformed, or unparseable input yields `"unknown"` for both
    /// fields.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        let mut tags = Self {
            language: Self::UNKNOWN.into(),
            content: Self::UNKNOWN.into(),
        };
        let Ok(parsed) = url::Url::parse(url) else {
            return tags;
        };
        let Some((_, xtags)) = parsed.query_pairs().find(|(k, _)| k == "xtags") else {
            return tags;
        };
        for part in xtags.split(':') {
            if let Some(lang) = part.strip_prefix("lang=") {
                let primary = lang.split('-').next().unwrap_or(lang);
                if !primary.is_empty() {
                    tags.language = primary.to_ascii_lowercase();
                }
            } else if let Some(content) = part.strip_prefix("acont=") {
                if !content.is_empty() {
                    tags.content = content.to_ascii_lowercase();
                }
            }
        }
        tags
    }

    /// Whether the primary language is English.
    #[must_use]
    pub fn is_english(&self) -> bool {
        self.language == "en"
    }

    /// Whether the track is the original (not dubbed) audio.
    #[must_use]
    pub fn is_original(&self) -> bool {
        self.content == "original"
    }
}

/// One selectable encoded rendition.
///
/// Immutable after classification except for [`url`](Self::url), which the
/// controller rewrites in place when a proxy fallback triggers.
#[derive(Clone, Debug)]
pub struct StreamFormat {
    id: FormatId,
    kind: MediaKind,
    mime_type: String,
    url: Option<String>,
    bitrate: u64,
    quality_label: Option<String>,
    height: Option<u32>,
    tags: OnceCell<AudioTags>,
}

impl StreamFormat {
    /// Builds a format from a decoded descriptor, deriving its kind from the
    /// MIME type.
    #[must_use]
    pub fn from_descriptor(d: FormatDescriptor) -> Self {
        let kind = if d.mime_type.starts_with("video") {
            MediaKind::Video {
                muxed_audio: AUDIO_CODEC_TOKENS.iter().any(|t| d.mime_type.contains(t)),
            }
        } else {
            MediaKind::Audio
        };
        let height = d.height.or_else(|| d.resolution.as_deref().and_then(parse_height));
        Self {
            id: d.id,
            kind,
            mime_type: d.mime_type,
            url: d.url.filter(|u| !u.is_empty()),
            bitrate: d.bitrate.unwrap_or(0),
            quality_label: d.quality_label,
            height,
            tags: OnceCell::new(),
        }
    }

    /// The quality identifier.
    #[must_use]
    pub fn id(&self) -> &FormatId {
        &self.id
    }

    /// The stream's kind.
    #[must_use]
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// The logical key of this stream.
    #[must_use]
    pub fn key(&self) -> StreamKey {
        StreamKey {
            track: self.kind.track(),
            id: self.id.clone(),
        }
    }

    /// The declared MIME type, codecs included.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The playable URL, if the page supplied one.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Audio ranking key.
    #[must_use]
    pub fn bitrate(&self) -> u64 {
        self.bitrate
    }

    /// Human label such as `720p60`.
    #[must_use]
    pub fn quality_label(&self) -> Option<&str> {
        self.quality_label.as_deref()
    }

    /// Vertical resolution in pixels.
    #[must_use]
    pub fn height(&self) -> Option<u32> {
        self.height
    }

    /// Whether the stream plays without a separate audio track.
    #[must_use]
    pub fn is_self_contained(&self) -> bool {
        matches!(self.kind, MediaKind::Video { muxed_audio: true })
    }

    /// Language/content tags, extracted from the URL on first access.
    pub fn audio_tags(&self) -> &AudioTags {
        self.tags
            .get_or_init(|| AudioTags::from_url(self.url.as_deref().unwrap_or_default()))
    }

    /// Whether the URL parses as an absolute URL.
    #[must_use]
    pub fn has_valid_url(&self) -> bool {
        self.url.as_deref().is_some_and(|u| url::Url::parse(u).is_ok())
    }

    pub(crate) fn set_url(&mut self, url: String) {
        self.url = Some(url);
    }
}

fn parse_height(resolution: &str) -> Option<u32> {
    resolution.trim_end_matches('p').parse().ok()
}

/// A format entry as embedded in the page.
///
/// Field names follow the upstream API (`itag`, `type`, `resolution`);
/// numeric fields are accepted as numbers or numeric strings. Entries may
/// carry both `id` and `itag`, or both `mimeType` and `type`; `itag` and
/// `mimeType` win.
#[derive(Clone, Debug, Deserialize)]
#[serde(try_from = "RawDescriptor")]
pub struct FormatDescriptor {
    /// Quality identifier.
    pub id: FormatId,
    /// MIME type with codecs, e.g. `video/mp4; codecs="avc1.4d401f"`.
    pub mime_type: String,
    /// Playable URL.
    pub url: Option<String>,
    /// Bits per second.
    pub bitrate: Option<u64>,
    /// Label such as `1080p`.
    pub quality_label: Option<String>,
    /// Vertical resolution.
    pub height: Option<u32>,
    /// Resolution string such as `720p`; used when no height is given.
    pub resolution: Option<String>,
}

/// Wire shape of a [`FormatDescriptor`], before key precedence is applied.
#[derive(Deserialize)]
struct RawDescriptor {
    #[serde(default, deserialize_with = "opt_format_id")]
    id: Option<FormatId>,
    #[serde(default, deserialize_with = "opt_format_id")]
    itag: Option<FormatId>,
    #[serde(default, rename = "mimeType")]
    mime_type: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default, deserialize_with = "opt_number")]
    bitrate: Option<u64>,
    #[serde(default, rename = "qualityLabel")]
    quality_label: Option<String>,
    #[serde(default, rename = "resolutionHeight", deserialize_with = "opt_number_u32")]
    height: Option<u32>,
    #[serde(default)]
    resolution: Option<String>,
}

impl TryFrom<RawDescriptor> for FormatDescriptor {
    type Error = DescriptorError;

    fn try_from(raw: RawDescriptor) -> Result<Self, Self::Error> {
        Ok(Self {
            id: raw.itag.or(raw.id).ok_or(DescriptorError::MissingId)?,
            mime_type: raw
                .mime_type
                .or(raw.kind)
                .ok_or(DescriptorError::MissingMimeType)?,
            url: raw.url,
            bitrate: raw.bitrate,
            quality_label: raw.quality_label,
            height: raw.height,
            resolution: raw.resolution,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(number::Number),
}

mod number {
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    pub(super) enum Number {
        Int(u64),
        Float(f64),
    }

    impl Number {
        pub(super) fn render(&self) -> String {
            match self {
                Self::Int(n) => n.to_string(),
                Self::Float(f) => f.to_string(),
            }
        }

        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "bitrates and heights are small non-negative values"
        )]
        pub(super) fn as_u64(&self) -> Option<u64> {
            match *self {
                Self::Int(n) => Some(n),
                Self::Float(f) if f.is_finite() && f >= 0.0 => Some(f as u64),
                Self::Float(_) => None,
            }
        }
    }
}

fn opt_format_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<FormatId>, D::Error> {
    Ok(match Option::<StringOrNumber>::deserialize(d)? {
        None => None,
        Some(StringOrNumber::String(s)) => Some(FormatId(s)),
        Some(StringOrNumber::Number(n)) => Some(FormatId(n.render())),
    })
}

fn opt_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    Ok(match Option::<StringOrNumber>::deserialize(d)? {
        None => None,
        Some(StringOrNumber::String(s)) => s.trim().parse().ok(),
        Some(StringOrNumber::Number(n)) => n.as_u64(),
    })
}

fn opt_number_u32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    Ok(opt_number(d)?.and_then(|n| u32::try_from(n).ok()))
}

/// The two format lists the page embeds.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageFormats {
    /// Combined (muxed) streams.
    pub format_streams: Vec<FormatDescriptor>,
    /// Adaptive (single elementary stream) formats.
    pub adaptive_formats: Vec<FormatDescriptor>,
}

impl PageFormats {
    /// Builds the catalog, combined list first.
    #[must_use]
    pub fn into_catalog(self) -> FormatCatalog {
        FormatCatalog::from_page(self.format_streams, self.adaptive_formats)
    }
}

/// Video formats keyed by identifier plus an unordered audio pool.
#[derive(Clone, Debug, Default)]
pub struct FormatCatalog {
    video: HashMap<FormatId, StreamFormat>,
    audio: Vec<StreamFormat>,
}

impl FormatCatalog {
    /// Partitions descriptors into video and audio formats.
    ///
    /// A duplicate video identifier silently replaces the earlier entry. An
    /// empty input yields an empty catalog; lookups then return `None`.
    #[must_use]
    pub fn classify(descriptors: impl IntoIterator<Item = FormatDescriptor>) -> Self {
        let mut catalog = Self::default();
        for d in descriptors {
            let format = StreamFormat::from_descriptor(d);
            match format.kind {
                MediaKind::Video { .. } => {
                    catalog.video.insert(format.id.clone(), format);
                }
                MediaKind::Audio => catalog.audio.push(format),
            }
        }
        catalog
    }

    /// Classifies the page's combined list followed by its adaptive list.
    #[must_use]
    pub fn from_page(
        combined: impl IntoIterator<Item = FormatDescriptor>,
        adaptive: impl IntoIterator<Item = FormatDescriptor>,
    ) -> Self {
        Self::classify(combined.into_iter().chain(adaptive))
    }

    /// Looks up a video format.
    #[must_use]
    pub fn video(&self, id: &FormatId) -> Option<&StreamFormat> {
        self.video.get(id)
    }

    /// Looks up a video format that has a URL to load.
    pub fn playable_video(&self, id: &FormatId) -> Result<&StreamFormat, CatalogError> {
        let format = self
            .video
            .get(id)
            .ok_or_else(|| CatalogError::UnknownFormat(id.clone()))?;
        if format.url().is_none() {
            return Err(CatalogError::MissingUrl(id.clone()));
        }
        Ok(format)
    }

    /// Iterates the video identifiers in no particular order.
    pub fn video_ids(&self) -> impl Iterator<Item = &FormatId> {
        self.video.keys()
    }

    /// The audio pool, in input order.
    #[must_use]
    pub fn audio_pool(&self) -> &[StreamFormat] {
        &self.audio
    }

    /// Looks up a stream of either kind by its logical key.
    #[must_use]
    pub fn stream(&self, key: &StreamKey) -> Option<&StreamFormat> {
        match key.track {
            Track::Video => self.video.get(&key.id),
            Track::Audio => self.audio.iter().find(|f| f.id == key.id),
        }
    }

    /// Replaces the URL of a stream in place. Returns `false` if the key is
    /// unknown.
    pub fn rewrite_url(&mut self, key: &StreamKey, url: String) -> bool {
        let slot = match key.track {
            Track::Video => self.video.get_mut(&key.id),
            Track::Audio => self.audio.iter_mut().find(|f| f.id == key.id),
        };
        match slot {
            Some(format) => {
                format.set_url(url);
                true
            }
            None => false,
        }
    }

    /// Points a video format at the source the page already resolved, so the
    /// first load does not fetch a different resource.
    pub fn patch_video_url(&mut self, id: &FormatId, url: &str) -> bool {
        if url.is_empty() {
            return false;
        }
        self.rewrite_url(
            &StreamKey {
                track: Track::Video,
                id: id.clone(),
            },
            url.to_owned(),
        )
    }

    /// Whether the catalog has no video formats.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.video.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(id: &str, mime: &str, url: &str, bitrate: u64) -> FormatDescriptor {
        FormatDescriptor {
            id: FormatId::new(id),
            mime_type: mime.into(),
            url: Some(url.into()),
            bitrate: Some(bitrate),
            quality_label: None,
            height: None,
            resolution: None,
        }
    }

    #[test]
    fn classify_partitions_by_mime_prefix() {
        let catalog = FormatCatalog::classify([
            descriptor("18", r#"video/mp4; codecs="avc1.42001E, mp4a.40.2""#, "https://a/18", 500),
            descriptor("137", r#"video/mp4; codecs="avc1.640028""#, "https://a/137", 4000),
            descriptor("140", r#"audio/mp4; codecs="mp4a.40.2""#, "https://a/140", 128),
            descriptor("251", r#"audio/webm; codecs="opus""#, "https://a/251", 160),
        ]);

        assert!(catalog.video(&FormatId::new("18")).is_some());
        assert!(catalog.video(&FormatId::new("137")).is_some());
        assert!(catalog.video(&FormatId::new("140")).is_none());
        let audio_ids: Vec<_> = catalog.audio_pool().iter().map(|f| f.id().as_str()).collect();
        assert_eq!(audio_ids, ["140", "251"]);
        assert!(catalog.audio_pool().iter().all(|f| f.kind() == MediaKind::Audio));
    }

    #[test]
    fn muxed_audio_detected_from_codecs() {
        let catalog = FormatCatalog::classify([
            descriptor("18", r#"video/mp4; codecs="avc1.42001E, mp4a.40.2""#, "https://a/18", 0),
            descriptor("248", r#"video/webm; codecs="vp9""#, "https://a/248", 0),
        ]);
        assert!(catalog.video(&FormatId::new("18")).unwrap().is_self_contained());
        assert!(!catalog.video(&FormatId::new("248")).unwrap().is_self_contained());
    }

    #[test]
    fn duplicate_video_id_last_wins() {
        let catalog = FormatCatalog::classify([
            descriptor("22", "video/mp4", "https://a/first", 0),
            descriptor("22", "video/mp4", "https://a/second", 0),
        ]);
        let format = catalog.video(&FormatId::new("22")).unwrap();
        assert_eq!(format.url(), Some("https://a/second"));
    }

    #[test]
    fn empty_catalog_lookups_fail() {
        let catalog = FormatCatalog::classify([]);
        assert!(catalog.is_empty());
        assert!(matches!(
            catalog.playable_video(&FormatId::new("22")),
            Err(CatalogError::UnknownFormat(_))
        ));
    }

    #[test]
    fn missing_url_is_not_playable() {
        let mut d = descriptor("22", "video/mp4", "", 0);
        d.url = None;
        let catalog = FormatCatalog::classify([d]);
        assert!(matches!(
            catalog.playable_video(&FormatId::new("22")),
            Err(CatalogError::MissingUrl(_))
        ));
    }

    #[test]
    fn xtags_are_parsed_and_normalized() {
        let tags = AudioTags::from_url(
            "https://r1.googlevideo.com/videoplayback?itag=140&xtags=acont%3Doriginal%3Alang%3Den-US",
        );
        assert_eq!(tags.language, "en");
        assert_eq!(tags.content, "original");
        assert!(tags.is_english() && tags.is_original());
    }

    #[test]
    fn xtags_default_to_unknown() {
        let none = AudioTags::from_url("https://host/videoplayback?itag=140");
        assert_eq!(none.language, "unknown");
        assert_eq!(none.content, "unknown");

        let garbage = AudioTags::from_url("not a url");
        assert_eq!(garbage.language, "unknown");

        let partial = AudioTags::from_url("https://host/v?xtags=acont=dubbed");
        assert_eq!(partial.language, "unknown");
        assert_eq!(partial.content, "dubbed");
    }

    #[test]
    fn patch_and_rewrite_update_in_place() {
        let mut catalog = FormatCatalog::classify([
            descriptor("22", "video/mp4", "https://a/22", 0),
            descriptor("140", "audio/mp4", "https://a/140", 0),
        ]);
        assert!(catalog.patch_video_url(&FormatId::new("22"), "https://page/22"));
        assert!(!catalog.patch_video_url(&FormatId::new("99"), "https://page/99"));
        assert!(!catalog.patch_video_url(&FormatId::new("22"), ""));

        let key = StreamKey {
            track: Track::Audio,
            id: FormatId::new("140"),
        };
        assert!(catalog.rewrite_url(&key, "https://proxy/140".into()));
        assert_eq!(catalog.stream(&key).unwrap().url(), Some("https://proxy/140"));
        assert_eq!(
            catalog.video(&FormatId::new("22")).unwrap().url(),
            Some("https://page/22")
        );
    }

    #[test]
    fn descriptors_decode_upstream_field_names() {
        let json = r#"[
            {"itag": "137", "type": "video/mp4; codecs=\"avc1.640028\"", "url": "https://a/137",
             "bitrate": "4000000", "qualityLabel": "1080p", "resolution": "1080p"},
            {"itag": 140, "mimeType": "audio/mp4; codecs=\"mp4a.40.2\"", "url": "https://a/140",
             "bitrate": 130000}
        ]"#;
        let descriptors: Vec<FormatDescriptor> = serde_json::from_str(json).unwrap();
        let catalog = FormatCatalog::classify(descriptors);
        let video = catalog.video(&FormatId::new("137")).unwrap();
        assert_eq!(video.bitrate(), 4_000_000);
        assert_eq!(video.height(), Some(1080));
        assert_eq!(video.quality_label(), Some("1080p"));
        assert_eq!(catalog.audio_pool()[0].id().as_str(), "140");
        assert_eq!(catalog.audio_pool()[0].bitrate(), 130_000);
    }

    #[test]
    fn descriptors_with_both_key_spellings_decode() {
        let json = r#"{"id": "ignored", "itag": 251, "mimeType": "audio/webm; codecs=\"opus\"",
            "type": "audio/webm", "url": "https://a/251", "bitrate": 160000}"#;
        let d: FormatDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(d.id.as_str(), "251");
        assert_eq!(d.mime_type, r#"audio/webm; codecs="opus""#);

        let d: FormatDescriptor =
            serde_json::from_str(r#"{"id": "22", "type": "video/mp4", "url": "https://a/22"}"#)
                .unwrap();
        assert_eq!(d.id.as_str(), "22");
        assert_eq!(d.mime_type, "video/mp4");
    }

    #[test]
    fn descriptors_without_id_or_type_are_rejected() {
        let err = serde_json::from_str::<FormatDescriptor>(r#"{"type": "video/mp4"}"#).unwrap_err();
        assert!(err.to_string().contains("no `itag` or `id`"), "{err}");
        let err = serde_json::from_str::<FormatDescriptor>(r#"{"itag": 18}"#).unwrap_err();
        assert!(err.to_string().contains("no `mimeType` or `type`"), "{err}");
    }

    #[test]
    fn page_formats_combine_both_lists() {
        let page: PageFormats = serde_json::from_str(
            r#"{"formatStreams": [{"itag": 18, "type": "video/mp4; codecs=\"avc1, mp4a.40.2\"", "url": "https://a/18"}],
                "adaptiveFormats": [{"itag": 251, "type": "audio/webm; codecs=\"opus\"", "url": "https://a/251"}],
                "title": "ignored"}"#,
        )
        .unwrap();
        let catalog = page.into_catalog();
        assert!(catalog.video(&FormatId::new("18")).unwrap().is_self_contained());
        assert_eq!(catalog.audio_pool().len(), 1);
    }
}
