// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use web_sys::Storage;

use tandem_core::config::QUALITY_STORAGE_KEY;
use tandem_core::format::FormatId;

/// The quality preference persisted in `localStorage`.
///
/// Storage can be unavailable (private browsing, disabled cookies). Every
/// operation then degrades to a no-op.
#[derive(Debug)]
pub struct QualityStore {
    storage: Option<Storage>,
}

impl QualityStore {
    /// Opens the window's local storage.
    #[must_use]
    pub fn open() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        Self { storage }
    }

    /// The saved format id, if any.
    #[must_use]
    pub fn load(&self) -> Option<String> {
        self.storage
            .as_ref()?
            .get_item(QUALITY_STORAGE_KEY)
            .ok()
            .flatten()
            .filter(|s| !s.is_empty())
    }

    /// Remembers `id` for the next page load.
    pub fn save(&self, id: &FormatId) {
        if let Some(storage) = &self.storage {
            _ = storage.set_item(QUALITY_STORAGE_KEY, id.as_str());
        }
    }
}
