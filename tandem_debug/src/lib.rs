// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing, JSON-lines and `tracing` sinks for tandem diagnostics.
//!
//! This crate provides [`TraceSink`](tandem_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`json::JsonLinesSink`]: one JSON object per line, for tooling.
//! - [`tracing_sink::TracingSink`]: forwards events to the `tracing`
//!   ecosystem with structured fields.

pub mod json;
pub mod pretty;
pub mod tracing_sink;
