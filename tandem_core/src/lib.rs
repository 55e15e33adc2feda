// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Platform-agnostic controller for split video/audio playback.
//!
//! `tandem_core` plays adaptive streams that deliver picture and sound as
//! separate resources. It picks the streams, attaches them to two
//! independently buffering media elements with retry and proxy fallback,
//! and keeps the two elements in lockstep through loading, seeking,
//! stalling and quality switches. It has no browser types: elements and
//! connection hints are reached through traits that backends implement.
//!
//! # Architecture
//!
//! The host runs a cooperative, single-threaded loop. It forwards element
//! events and user input to the controller and ticks it from an
//! animation-frame loop plus a coarse interval:
//!
//! ```text
//!   page descriptors ──► FormatCatalog ──► select_best_audio()
//!                              │                  │
//!                              ▼                  ▼
//!   InputRouter ──Command──► Synchronizer ◄── MediaEvent (host)
//!                              │     ▲
//!                   LoadCycle ◄┘     └── tick(now) (RafLoop / interval)
//!                      │
//!                      ▼
//!   ConnectionWarmer ──► MediaElement::set_source()
//! ```
//!
//! **[`format`]**: Stream formats, page descriptor decoding and the
//! [`FormatCatalog`](format::FormatCatalog) partition into video formats and
//! an audio pool.
//!
//! **[`audio`]**: Three-tier audio track selection.
//!
//! **[`proxy`]**: The origin-rewrite rule and the sticky per-stream proxy
//! table.
//!
//! **[`loader`]**: Per-element attempt bookkeeping: lock on first buffer,
//! proxy retry, linear backoff, exhaustion.
//!
//! **[`warmer`]**: The [`ResourceHints`](warmer::ResourceHints) seam and
//! per-origin connection warming.
//!
//! **[`sync`]**: The [`Synchronizer`](sync::Synchronizer) state machine:
//! join barrier, seek and stall freezes, drift correction, quality switch.
//!
//! **[`router`]**: Key table, gesture gating, debounce, timestamp links.
//!
//! **[`media`]**: The [`MediaElement`](media::MediaElement) seam and element
//! events.
//!
//! **[`wait`]**: Generation-checked deadline waits; the single
//! cancellation point for asynchronous continuations.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) and the controller's
//! events and conditions.
//!
//! **[`config`]**, **[`session`]**, **[`time`]**, **[`timestamp`]** and
//! **[`error`]** hold the supporting types.

pub mod audio;
pub mod config;
pub mod error;
pub mod format;
pub mod loader;
pub mod media;
pub mod proxy;
pub mod router;
pub mod session;
pub mod sync;
pub mod time;
pub mod timestamp;
pub mod trace;
pub mod wait;
pub mod warmer;
