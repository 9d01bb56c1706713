//! Shared fixtures for the memory index integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use lifelog_embeddings::{DEFAULT_DIMENSION, Embedding, EmbeddingError, EmbeddingProvider};
use lifelog_memory_index::{DomainRecord, Event, EventKind, MemoryStore, Mood, Note};

/// Deterministic provider: each lowercase word adds 1.0 to one axis.
///
/// Requests are numbered from zero; the numbers in `failing` answer with
/// a 503.
pub struct KeywordProvider {
    configured: bool,
    failing: HashSet<usize>,
    truncate_to: Option<usize>,
    requests: Mutex<Vec<Vec<String>>>,
}

impl KeywordProvider {
    pub fn new() -> Self {
        Self {
            configured: true,
            failing: HashSet::new(),
            truncate_to: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    pub fn failing_on(mut self, request: usize) -> Self {
        self.failing.insert(request);
        self
    }

    /// Answer with vectors cut to `len` while still claiming the full
    /// dimension.
    pub fn returning_length(mut self, len: usize) -> Self {
        self.truncate_to = Some(len);
        self
    }

    /// Inputs of every request issued so far.
    pub fn requests(&self) -> Vec<Vec<String>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn vector_for(text: &str) -> Embedding {
        let mut vector = vec![0.0; DEFAULT_DIMENSION];
        for word in text.split(|c: char| !c.is_alphanumeric()) {
            if word.is_empty() {
                continue;
            }
            let word = word.to_lowercase();
            let axis = word
                .bytes()
                .fold(2166136261u32, |hash, b| (hash ^ u32::from(b)).wrapping_mul(16777619));
            vector[axis as usize % DEFAULT_DIMENSION] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordProvider {
    fn name(&self) -> &str {
        "keyword"
    }

    fn model(&self) -> &str {
        "keyword-test"
    }

    fn dimension(&self) -> usize {
        DEFAULT_DIMENSION
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn request_embeddings(
        &self,
        texts: &[&str],
    ) -> lifelog_embeddings::Result<Vec<Embedding>> {
        let request = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(texts.iter().map(|t| (*t).to_string()).collect());
            requests.len() - 1
        };

        if self.failing.contains(&request) {
            return Err(EmbeddingError::Provider {
                status: 503,
                body: "unavailable".to_string(),
            });
        }

        Ok(texts
            .iter()
            .map(|t| {
                let mut vector = Self::vector_for(t);
                if let Some(len) = self.truncate_to {
                    vector.truncate(len);
                }
                vector
            })
            .collect())
    }
}

pub async fn add_note(store: &MemoryStore, id: &str, summary: &str, content: &str) {
    store
        .insert_event(Event::new(id, EventKind::Note, "2024-05-04T18:00:00Z", summary))
        .await
        .unwrap();
    store
        .attach(
            id,
            DomainRecord::Note(Note {
                content: content.to_string(),
            }),
        )
        .await
        .unwrap();
}

pub async fn add_mood(store: &MemoryStore, id: &str, score: u8, note: &str) {
    store
        .insert_event(Event::new(id, EventKind::Mood, "2024-05-05T08:00:00Z", ""))
        .await
        .unwrap();
    store
        .attach(
            id,
            DomainRecord::Mood(Mood {
                score,
                note: Some(note.to_string()),
            }),
        )
        .await
        .unwrap();
}

/// An event that composes to empty text.
pub async fn add_blank(store: &MemoryStore, id: &str) {
    store
        .insert_event(Event::new(id, EventKind::Other, "2024-05-06T08:00:00Z", ""))
        .await
        .unwrap();
}
