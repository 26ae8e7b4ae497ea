//! Chunk sizing.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Upper bounds on cells and UEs per evaluator call. `None` or zero means
/// "no bound".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChunkSettings {
    #[serde(default)]
    pub cells_chunk: Option<usize>,
    #[serde(default)]
    pub ue_chunk: Option<usize>,
}

impl ChunkSettings {
    pub fn new(cells_chunk: Option<usize>, ue_chunk: Option<usize>) -> Self {
        ChunkSettings {
            cells_chunk,
            ue_chunk,
        }
    }
}

/// Splits `0..len` into consecutive ranges of at most `chunk` items.
pub fn chunk_ranges(len: usize, chunk: Option<usize>) -> Vec<Range<usize>> {
    if len == 0 {
        return Vec::new();
    }
    let size = match chunk {
        Some(n) if n > 0 => n,
        _ => len,
    };
    (0..len)
        .step_by(size)
        .map(|start| start..(start + size).min(len))
        .collect()
}
