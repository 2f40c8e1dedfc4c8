//! Document Chunker: splits policy text into overlapping windows that prefer natural
//! boundaries.
//!
//! Every chunk is a slice of the original text and chunk `i+1` starts exactly `overlap`
//! characters before the end of chunk `i`, so stripping that prefix from each later chunk
//! and concatenating reconstructs the input byte for byte. Sizes are in characters.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::policy::{ChunkMetadata, PolicyDocument};

/// Split preference, best first. The empty separator is a hard cut.
pub const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " ", ""];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkError {
    #[error("chunk size must be greater than zero")]
    ZeroSize,

    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({size})")]
    OverlapTooLarge { size: usize, overlap: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable identity: derived from policy name, version and position.
    pub id: Uuid,
    pub index: usize,
    /// Character offset of the first character within the source document.
    pub start: usize,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// Deterministic id for the `index`-th chunk of a document version.
pub fn chunk_id(policy_name: &str, version: &str, index: usize) -> Uuid {
    let key = format!("{policy_name}\u{1f}{version}\u{1f}{index}");
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
}

#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    max_size: usize,
    overlap: usize,
}

impl Chunker {
    pub fn new(max_size: usize, overlap: usize) -> Result<Self, ChunkError> {
        if max_size == 0 {
            return Err(ChunkError::ZeroSize);
        }
        if overlap >= max_size {
            return Err(ChunkError::OverlapTooLarge {
                size: max_size,
                overlap,
            });
        }
        Ok(Self { max_size, overlap })
    }

    /// Chunks a document, attaching its metadata to every piece.
    pub fn chunk(&self, document: &PolicyDocument) -> Vec<Chunk> {
        let metadata = ChunkMetadata::from(document);
        self.split_text(&document.content)
            .into_iter()
            .enumerate()
            .map(|(index, (start, text))| Chunk {
                id: chunk_id(&document.name, &document.version, index),
                index,
                start,
                text: text.to_string(),
                metadata: metadata.clone(),
            })
            .collect()
    }

    /// Returns `(char_offset, slice)` windows over `text`.
    pub fn split_text<'a>(&self, text: &'a str) -> Vec<(usize, &'a str)> {
        // Byte offset of every char boundary, plus the end of the string.
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(b, _)| b)
            .chain(std::iter::once(text.len()))
            .collect();
        let total = boundaries.len() - 1;
        if total == 0 {
            return Vec::new();
        }

        let mut windows = Vec::new();
        let mut start = 0;
        loop {
            if total - start <= self.max_size {
                windows.push((start, &text[boundaries[start]..]));
                break;
            }

            let limit = start + self.max_size;
            let end = self.find_split(text, &boundaries, start, limit);
            windows.push((start, &text[boundaries[start]..boundaries[end]]));
            start = end - self.overlap;
        }
        windows
    }

    /// Picks the end (exclusive, in chars) of the window starting at `start`.
    ///
    /// The end must lie in `(start + overlap, limit]` so the next window makes progress.
    fn find_split(&self, text: &str, boundaries: &[usize], start: usize, limit: usize) -> usize {
        let min_end = start + self.overlap + 1;
        let search_from = boundaries[start];
        let search_to = boundaries[limit];
        let window = &text[search_from..search_to];

        for separator in SEPARATORS.iter().filter(|s| !s.is_empty()) {
            // Only the last occurrence matters: earlier ones end even sooner.
            if let Some(pos) = window.rfind(separator) {
                let end = char_index(boundaries, search_from + pos + separator.len());
                if end >= min_end {
                    return end;
                }
            }
        }
        limit
    }
}

fn char_index(boundaries: &[usize], byte: usize) -> usize {
    boundaries
        .binary_search(&byte)
        .unwrap_or_else(|insert_at| insert_at)
}
