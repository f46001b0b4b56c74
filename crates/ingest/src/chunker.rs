use unicode_segmentation::UnicodeSegmentation;

use crate::chunk::Chunk;

pub struct ChunkerConfig {
    /// Maximum chunk length in characters
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Splits text into overlapping character windows, preferring to cut at
/// paragraph, line and word boundaries in the back half of each window.
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    pub fn chunk_text(
        &self,
        doc_id: &str,
        text: &str,
        source: &str,
    ) -> Vec<Chunk> {
        let graphemes: Vec<&str> = text.graphemes(true).collect();
        let len = graphemes.len();
        let size = self.config.chunk_size.max(1);
        let overlap = self.config.chunk_overlap.min(size - 1);

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < len {
            let hard_end = (start + size).min(len);
            let end = if hard_end < len {
                self.break_point(&graphemes, start, hard_end)
            } else {
                hard_end
            };

            let piece = graphemes[start..end].concat();
            if !piece.trim().is_empty() {
                chunks.push(Chunk::new(
                    doc_id.to_string(),
                    piece.trim().to_string(),
                    source.to_string(),
                    (start, end),
                ));
            }

            if end >= len {
                break;
            }

            // Step back by the overlap, but always make progress
            let next = end.saturating_sub(overlap);
            start = if next > start { next } else { end };
        }

        chunks
    }

    /// Pick the cut position for a window ending at `hard_end`.
    fn break_point(&self, graphemes: &[&str], start: usize, hard_end: usize) -> usize {
        let floor = start + (hard_end - start) / 2;

        // Paragraph break
        for i in (floor.max(start + 1)..hard_end).rev() {
            if is_newline(graphemes[i]) && is_newline(graphemes[i - 1]) {
                return i + 1;
            }
        }

        // Line break
        for i in (floor..hard_end).rev() {
            if is_newline(graphemes[i]) {
                return i + 1;
            }
        }

        // Word break
        for i in (floor..hard_end).rev() {
            if graphemes[i].chars().all(char::is_whitespace) {
                return i + 1;
            }
        }

        hard_end
    }
}

fn is_newline(grapheme: &str) -> bool {
    grapheme == "\n" || grapheme == "\r\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_text(words: usize) -> String {
        (0..words)
            .map(|i| format!("word{}", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_basic_chunking() {
        let chunker = Chunker::new(ChunkerConfig::default());
        let text = "This is a test paragraph.\n\nThis is another paragraph.";
        let chunks = chunker.chunk_text("test-doc", text, "test.txt");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].doc_id, "test-doc");
        assert_eq!(chunks[0].text, text);
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        let chunker = Chunker::new(ChunkerConfig::default());
        assert!(chunker.chunk_text("d", "", "s").is_empty());
        assert!(chunker.chunk_text("d", "   \n\n  ", "s").is_empty());
    }

    #[test]
    fn test_windows_respect_size_and_overlap() {
        let chunker = Chunker::new(ChunkerConfig::default());
        let text = sample_text(1200);
        let chunks = chunker.chunk_text("doc", &text, "pubmed");

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.span_len() <= 1000);
            assert!(chunk.text.graphemes(true).count() <= 1000);
        }
        for pair in chunks.windows(2) {
            // next window starts before the previous one ends
            assert!(pair[1].offset.0 < pair[0].offset.1);
            assert!(pair[1].offset.0 > pair[0].offset.0);
        }
        assert_eq!(chunks.last().map(|c| c.offset.1), Some(text.graphemes(true).count()));
    }

    #[test]
    fn test_offsets_count_graphemes_not_chars() {
        let chunker = Chunker::new(ChunkerConfig::default());
        // "e" + combining acute accent is one grapheme but two chars
        let text = "cafe\u{301} ".repeat(300);
        let chunks = chunker.chunk_text("doc", &text, "notes");

        assert_eq!(text.graphemes(true).count(), 1500);
        assert_eq!(chunks.last().map(|c| c.offset.1), Some(1500));
        for chunk in &chunks {
            assert!(chunk.span_len() <= 1000);
            assert!(!chunk.text.starts_with('\u{301}'));
        }
    }

    #[test]
    fn test_prefers_paragraph_breaks() {
        let chunker = Chunker::new(ChunkerConfig {
            chunk_size: 40,
            chunk_overlap: 0,
        });
        let text = "First paragraph about statins.\n\nSecond paragraph about diabetes risk.";
        let chunks = chunker.chunk_text("doc", text, "s");

        assert_eq!(chunks[0].text, "First paragraph about statins.");
        assert!(chunks[1].text.starts_with("Second paragraph"));
    }

    #[test]
    fn test_overlap_larger_than_size_still_progresses() {
        let chunker = Chunker::new(ChunkerConfig {
            chunk_size: 10,
            chunk_overlap: 50,
        });
        let chunks = chunker.chunk_text("doc", &"x".repeat(35), "s");

        assert!(chunks.len() >= 4);
        assert_eq!(chunks.last().map(|c| c.offset.1), Some(35));
    }
}
