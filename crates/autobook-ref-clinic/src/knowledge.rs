//! The clinic knowledge base and its lexical retriever.
//!
//! The corpus is split into overlapping character windows. A search scores
//! each chunk by how many distinct query terms it contains and returns the
//! best `top_k`, ties going to the chunk that comes first in the document.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::debug;

use autobook_config::KnowledgeConfig;
use autobook_contracts::error::{AutobookError, AutobookResult};
use autobook_core::traits::Retriever;

/// The bundled clinic corpus.
pub const CLINIC_KNOWLEDGE: &str = include_str!("../knowledge/clinic.md");

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "at", "be", "can", "do", "does", "for", "i", "in", "is", "it", "me",
    "my", "of", "on", "or", "the", "to", "what", "when", "with", "you", "your",
];

/// Split `text` into windows of at most `size` characters, each starting
/// `overlap` characters before the previous one ended. Windows end on
/// whitespace when one falls in their second half.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> AutobookResult<Vec<String>> {
    if size == 0 || overlap >= size {
        return Err(AutobookError::ConfigError {
            reason: format!("cannot chunk with size {size} and overlap {overlap}"),
        });
    }

    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let mut end = (start + size).min(chars.len());
        if end < chars.len() {
            if let Some(ws) = (start + size / 2..end).rev().find(|&i| chars[i].is_whitespace()) {
                end = ws;
            }
        }

        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        if end >= chars.len() {
            break;
        }

        // Step back by the overlap, then forward to the next word start.
        let mut next = end.saturating_sub(overlap).max(start + 1);
        while next < end && !chars[next - 1].is_whitespace() {
            next += 1;
        }
        start = next;
    }

    Ok(chunks)
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .collect()
}

/// Term-overlap search over a chunked corpus.
#[derive(Debug, Clone)]
pub struct KeywordRetriever {
    chunks: Vec<(String, HashSet<String>)>,
    top_k: usize,
}

impl KeywordRetriever {
    pub fn new(corpus: &str, config: &KnowledgeConfig) -> AutobookResult<Self> {
        let chunks = chunk_text(corpus, config.chunk_size, config.chunk_overlap)?
            .into_iter()
            .map(|chunk| {
                let index = terms(&chunk);
                (chunk, index)
            })
            .collect::<Vec<_>>();
        debug!(chunks = chunks.len(), top_k = config.top_k, "knowledge index built");
        Ok(Self { chunks, top_k: config.top_k })
    }

    /// The bundled clinic corpus.
    pub fn clinic(config: &KnowledgeConfig) -> AutobookResult<Self> {
        Self::new(CLINIC_KNOWLEDGE, config)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Chunks ranked for `query`, best first. Chunks sharing no term are
    /// left out.
    pub fn rank(&self, query: &str) -> Vec<&str> {
        let wanted = terms(query);
        let mut scored: Vec<(usize, usize)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(idx, (_, index))| (idx, wanted.iter().filter(|t| index.contains(*t)).count()))
            .filter(|&(_, score)| score > 0)
            .collect();
        // Stable sort keeps document order among equal scores.
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored
            .into_iter()
            .take(self.top_k)
            .map(|(idx, _)| self.chunks[idx].0.as_str())
            .collect()
    }
}

#[async_trait]
impl Retriever for KeywordRetriever {
    async fn search(&self, query: &str) -> AutobookResult<String> {
        let hits = self.rank(query);
        debug!(query, hits = hits.len(), "knowledge search");
        Ok(hits.join("\n\n"))
    }
}
