// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! Only construction and parsing fail with `Result`. Runtime failures inside
//! the controller (load errors, rejected play requests, unknown quality
//! selections) are reported to the [`TraceSink`](crate::trace::TraceSink)
//! instead and never propagate to the caller.

use thiserror::Error;

use crate::format::FormatId;

/// A catalog lookup that cannot produce a loadable stream.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// No video format has this identifier.
    #[error("unknown video format `{0}`")]
    UnknownFormat(FormatId),
    /// The format exists but carries no URL.
    #[error("video format `{0}` has no playable url")]
    MissingUrl(FormatId),
    /// The catalog holds no video formats at all.
    #[error("format catalog has no video formats")]
    NoVideoFormats,
}

/// A page format entry missing a required field.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DescriptorError {
    /// Neither `itag` nor `id` was present.
    #[error("format entry has no `itag` or `id`")]
    MissingId,
    /// Neither `mimeType` nor `type` was present.
    #[error("format entry has no `mimeType` or `type`")]
    MissingMimeType,
}

/// Failure to construct a [`Synchronizer`](crate::sync::Synchronizer).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The initially rendered format cannot be loaded.
    #[error("initial format is not loadable: {0}")]
    InitialFormat(#[from] CatalogError),
}

/// A timestamp marker or `t` parameter that does not describe a time.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TimestampError {
    /// The input was empty.
    #[error("empty timestamp")]
    Empty,
    /// The input is not a number of seconds or an `XhYmZs` expression.
    #[error("malformed timestamp `{0}`")]
    Malformed(String),
}

/// An origin-rewrite rule that cannot be built.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RewriteError {
    /// The proxy origin is not an absolute URL with a host.
    #[error("invalid proxy origin `{0}`")]
    InvalidProxyOrigin(String),
}
