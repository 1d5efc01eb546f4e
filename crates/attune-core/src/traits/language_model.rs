// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Language-model adapter trait.

use async_trait::async_trait;

use crate::error::AttuneError;
use crate::traits::adapter::PluginAdapter;

/// Adapter for a synchronous, single-shot language model completion.
#[async_trait]
pub trait LanguageModel: PluginAdapter {
    /// Completes `user_text` under the given system instruction and returns the raw reply.
    async fn complete(
        &self,
        system_instruction: &str,
        user_text: &str,
    ) -> Result<String, AttuneError>;
}
