// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test doubles and sync metrics for the tandem controller.
//!
//! - [`sim`]: a scriptable [`MediaElement`](tandem_core::media::MediaElement)
//!   whose state tests drive through a shared handle.
//! - [`recording`]: a [`TraceSink`](tandem_core::trace::TraceSink) and a
//!   [`ResourceHints`](tandem_core::warmer::ResourceHints) that record what
//!   they receive.
//! - [`drift`]: rolling A/V drift grading.
//! - [`rig`]: a synchronizer wired to all of the above.

pub mod drift;
pub mod recording;
pub mod rig;
pub mod sim;
