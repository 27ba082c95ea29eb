use async_trait::async_trait;

use crate::application::ports::{TextSplitter, TextSplitterError};

/// Character windows of at most `chunk_size`, cut after the last whitespace
/// in the back half of the window when there is one. Consecutive chunks
/// share `chunk_overlap` characters.
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveCharacterSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    fn cut_point(&self, chars: &[char], start: usize, hard_end: usize) -> usize {
        let floor = start + self.chunk_size / 2;
        (floor.max(start + 1)..=hard_end)
            .rev()
            .find(|&i| chars[i - 1].is_whitespace())
            .unwrap_or(hard_end)
    }
}

#[async_trait]
impl TextSplitter for RecursiveCharacterSplitter {
    async fn split(&self, text: &str) -> Result<Vec<String>, TextSplitterError> {
        if self.chunk_size == 0 {
            return Err(TextSplitterError("chunk_size must be positive".to_string()));
        }

        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total {
            let hard_end = (start + self.chunk_size).min(total);
            let end = if hard_end == total {
                total
            } else {
                self.cut_point(&chars, start, hard_end)
            };

            chunks.push(chars[start..end].iter().collect());
            if end == total {
                break;
            }

            let next = end.saturating_sub(self.chunk_overlap);
            start = if next > start { next } else { end };
        }

        Ok(chunks)
    }
}
