// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait that all collaborator adapters must implement.

use crate::types::AdapterType;

/// The base trait for all Attune adapters.
///
/// Every adapter (job provider, language model, similarity index, etc.)
/// implements this trait so logs and metrics can name the collaborator.
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the type of collaborator this adapter fronts.
    fn adapter_type(&self) -> AdapterType;
}
