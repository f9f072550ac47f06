//! Note store
//!
//! Append-only record of past goals. The planning step writes to it and the
//! research branch reads a few matching entries back as context. The store is
//! owned by the orchestrator that was given it; there is no global instance.

use async_trait::async_trait;
use sdk::errors::EngineError;
use std::collections::HashSet;
use tokio::sync::RwLock;

#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn add(&self, text: &str) -> Result<(), EngineError>;

    /// Entries sharing at least one word with `query`, best match first
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, EngineError>;

    async fn entries(&self) -> Vec<String>;
}

/// Notes kept in memory for the lifetime of the process
#[derive(Debug, Default)]
pub struct InMemoryNotes {
    entries: RwLock<Vec<String>>,
}

impl InMemoryNotes {
    pub fn new() -> Self {
        Self::default()
    }
}

fn words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl NoteStore for InMemoryNotes {
    async fn add(&self, text: &str) -> Result<(), EngineError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EngineError::Notes("refusing to store an empty note".to_string()));
        }
        self.entries.write().await.push(text.to_string());
        Ok(())
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, EngineError> {
        let wanted = words(query);
        let entries = self.entries.read().await;

        let mut scored: Vec<(usize, usize, &String)> = entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                let overlap = words(entry).intersection(&wanted).count();
                (overlap > 0).then_some((overlap, index, entry))
            })
            .collect();

        // Highest overlap first, newest first among equals
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(_, _, entry)| entry.clone())
            .collect())
    }

    async fn entries(&self) -> Vec<String> {
        self.entries.read().await.clone()
    }
}
