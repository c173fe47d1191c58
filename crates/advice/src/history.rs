use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTORY_LEN: usize = 20;

/// Previously issued advice, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdviceHistory {
    entries: VecDeque<String>,
}

impl AdviceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, advice: &str) -> bool {
        self.entries.iter().any(|entry| entry == advice)
    }

    /// Append `advice`, evicting the oldest entries beyond `capacity`.
    pub fn record(&mut self, advice: impl Into<String>, capacity: usize) {
        self.entries.push_back(advice.into());
        while self.entries.len() > capacity {
            let _ = self.entries.pop_front();
        }
    }

    pub fn latest(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
