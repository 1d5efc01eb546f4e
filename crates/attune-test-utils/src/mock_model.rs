// SPDX-FileCopyrightText: 2026 Attune Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock language model for deterministic testing.
//!
//! `MockLanguageModel` implements `LanguageModel` with pre-configured replies.
//! Replies can be routed by a keyword found in the system instruction, which
//! keeps concurrent calls (the text adapter issues three at once)
//! deterministic. Unrouted calls pop from a FIFO queue and fall back to
//! "mock response".

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use attune_core::error::AttuneError;
use attune_core::traits::{LanguageModel, PluginAdapter};
use attune_core::types::AdapterType;

#[derive(Debug)]
enum Reply {
    Text(String),
    Fail(String),
}

#[derive(Debug)]
struct Rule {
    keyword: String,
    replies: VecDeque<Reply>,
}

pub struct MockLanguageModel {
    rules: Mutex<Vec<Rule>>,
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockLanguageModel {
    pub fn new() -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock pre-loaded with unrouted FIFO responses.
    pub fn with_responses(responses: Vec<String>) -> Self {
        let mut model = Self::new();
        model.responses.get_mut().extend(responses);
        model
    }

    /// Reply with `response` when the system instruction contains `keyword`
    /// (case-insensitive).
    ///
    /// Several replies for one keyword are served in order; the last one
    /// repeats once the others are used up.
    pub fn route(mut self, keyword: &str, response: &str) -> Self {
        self.push_rule(keyword, Reply::Text(response.to_string()));
        self
    }

    /// Fail calls whose system instruction contains `keyword`.
    pub fn fail_on(mut self, keyword: &str, message: &str) -> Self {
        self.push_rule(keyword, Reply::Fail(message.to_string()));
        self
    }

    fn push_rule(&mut self, keyword: &str, reply: Reply) {
        let keyword = keyword.to_lowercase();
        let rules = self.rules.get_mut();
        match rules.iter_mut().find(|r| r.keyword == keyword) {
            Some(rule) => rule.replies.push_back(reply),
            None => rules.push(Rule {
                keyword,
                replies: VecDeque::from([reply]),
            }),
        }
    }

    pub async fn add_response(&self, text: String) {
        self.responses.lock().await.push_back(text);
    }

    /// Every `(system_instruction, user_text)` pair seen so far.
    pub async fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().await.clone()
    }

    /// Number of calls whose system instruction contains `keyword`.
    pub async fn calls_matching(&self, keyword: &str) -> usize {
        let keyword = keyword.to_lowercase();
        self.calls
            .lock()
            .await
            .iter()
            .filter(|(system, _)| system.to_lowercase().contains(&keyword))
            .count()
    }

    async fn next_reply(&self, system_instruction: &str) -> Result<String, AttuneError> {
        let system = system_instruction.to_lowercase();
        {
            let mut rules = self.rules.lock().await;
            if let Some(rule) = rules.iter_mut().find(|r| system.contains(&r.keyword)) {
                let reply = if rule.replies.len() > 1 {
                    rule.replies.pop_front()
                } else {
                    rule.replies.front().map(|r| match r {
                        Reply::Text(t) => Reply::Text(t.clone()),
                        Reply::Fail(m) => Reply::Fail(m.clone()),
                    })
                };
                match reply {
                    Some(Reply::Text(text)) => return Ok(text),
                    Some(Reply::Fail(message)) => return Err(AttuneError::provider(message)),
                    None => {}
                }
            }
        }

        Ok(self
            .responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "mock response".to_string()))
    }
}

impl Default for MockLanguageModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockLanguageModel {
    fn name(&self) -> &str {
        "mock-language-model"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::LanguageModel
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn complete(
        &self,
        system_instruction: &str,
        user_text: &str,
    ) -> Result<String, AttuneError> {
        self.calls
            .lock()
            .await
            .push((system_instruction.to_string(), user_text.to_string()));
        self.next_reply(system_instruction).await
    }
}
