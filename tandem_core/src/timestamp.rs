// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Timestamp markers and the `t` address parameter.
//!
//! Links inside descriptions and comments carry their jump target in a
//! `data-clickable-timestamp` attribute as plain seconds. The page address
//! carries a `t` query parameter in the upstream platform's notation
//! (`90`, `90s`, `1m30s`, `1h2m3s`).

use url::Url;

use crate::error::TimestampError;

/// Name of the address parameter holding the playback position.
pub const TIME_PARAM: &str = "t";

/// Parses a link marker: decimal seconds, or `t` notation as a fallback.
pub fn parse_marker(marker: &str) -> Result<f64, TimestampError> {
    let marker = marker.trim();
    if marker.is_empty() {
        return Err(TimestampError::Empty);
    }
    match marker.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Ok(secs),
        Ok(_) => Err(TimestampError::Malformed(marker.to_owned())),
        Err(_) => parse_t_param(marker),
    }
}

/// Parses `t` notation into seconds.
pub fn parse_t_param(value: &str) -> Result<f64, TimestampError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TimestampError::Empty);
    }
    let malformed = || TimestampError::Malformed(value.to_owned());

    if let Ok(secs) = value.parse::<u64>() {
        return Ok(secs as f64);
    }

    let mut total: u64 = 0;
    let mut digits = String::new();
    // Units must appear in h, m, s order; each at most once.
    let mut last_rank = 0;
    for c in value.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let (rank, scale) = match c.to_ascii_lowercase() {
            'h' => (1, 3600),
            'm' => (2, 60),
            's' => (3, 1),
            _ => return Err(malformed()),
        };
        if rank <= last_rank || digits.is_empty() {
            return Err(malformed());
        }
        let n: u64 = digits.parse().map_err(|_| malformed())?;
        total = n
            .checked_mul(scale)
            .and_then(|v| total.checked_add(v))
            .ok_or_else(malformed)?;
        digits.clear();
        last_rank = rank;
    }
    if !digits.is_empty() {
        return Err(malformed());
    }
    Ok(total as f64)
}

/// Formats whole seconds as `<m>m<s>s`.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "media positions are far below u64::MAX seconds"
)]
pub fn format_t_param(seconds: f64) -> String {
    let whole = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}m{}s", whole / 60, whole % 60)
}

/// Returns `address` with its `t` parameter set to `seconds`, keeping every
/// other parameter. `None` if `address` is not an absolute URL.
#[must_use]
pub fn address_with_time(address: &str, seconds: f64) -> Option<String> {
    let mut url = Url::parse(address).ok()?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != TIME_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(TIME_PARAM, &format_t_param(seconds));
    Some(url.into())
}

/// Reads the start position from an address's `t` parameter.
#[must_use]
pub fn time_from_address(address: &str) -> Option<f64> {
    let url = Url::parse(address).ok()?;
    let (_, value) = url.query_pairs().find(|(k, _)| k == TIME_PARAM)?;
    parse_t_param(&value).ok()
}
