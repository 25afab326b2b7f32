//! Header-aware text chunking with an overlapping-window fallback.
//!
//! A "token" here is a whitespace-delimited substring, not a model subword.
//! Short documents are kept whole. Longer ones are split at markdown headers
//! (`#`, `##`, `###`), adjacent sections are merged greedily up to
//! `max_tokens + merge_margin`, and any single section larger than that is cut
//! into overlapping windows of `max_tokens`.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::ChunkError;
use crate::models::IndexingConfig;

pub const DEFAULT_MAX_TOKENS: usize = 1024;
pub const DEFAULT_MERGE_MARGIN: usize = 50;
pub const DEFAULT_OVERLAP: usize = 256;

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^#{1,3}\s+").expect("header pattern is valid")
});

/// Number of whitespace-delimited tokens in `text`.
pub fn count_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Slide a `max_tokens` window over `tokens`, advancing `max_tokens - overlap`
/// each step. The last window always ends at the final token, so it may be
/// shorter than `max_tokens`.
pub fn chunk_with_overlap(
    tokens: &[&str],
    max_tokens: usize,
    overlap: usize,
) -> Result<Vec<String>, ChunkError> {
    validate_window(max_tokens, overlap)?;

    let step = max_tokens - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < tokens.len() {
        let end = (start + max_tokens).min(tokens.len());
        chunks.push(tokens[start..end].join(" "));
        if end == tokens.len() {
            break;
        }
        start += step;
    }

    Ok(chunks)
}

fn validate_window(max_tokens: usize, overlap: usize) -> Result<(), ChunkError> {
    if max_tokens == 0 || overlap >= max_tokens {
        return Err(ChunkError::InvalidConfiguration {
            max_tokens,
            overlap,
        });
    }
    Ok(())
}

/// Split at header lines. Content before the first header is its own section;
/// sections are trimmed and empty ones dropped.
pub fn split_sections(text: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut last = 0;

    for m in HEADER_RE.find_iter(text) {
        if m.start() != last {
            let section = text[last..m.start()].trim();
            if !section.is_empty() {
                sections.push(section);
            }
        }
        last = m.start();
    }

    let tail = text[last..].trim();
    if !tail.is_empty() {
        sections.push(tail);
    }

    sections
}

/// Chunk with the default overlap for oversized sections.
pub fn header_aware_chunk(
    text: &str,
    max_tokens: usize,
    merge_margin: usize,
) -> Result<Vec<String>, ChunkError> {
    TextChunker::new(max_tokens, merge_margin, DEFAULT_OVERLAP).chunk(text)
}

/// Chunking parameters bundled from the indexing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    max_tokens: usize,
    merge_margin: usize,
    overlap: usize,
}

impl TextChunker {
    pub fn new(max_tokens: usize, merge_margin: usize, overlap: usize) -> Self {
        Self {
            max_tokens,
            merge_margin,
            overlap,
        }
    }

    pub fn from_config(config: &IndexingConfig) -> Self {
        Self::new(config.max_tokens, config.merge_margin, config.overlap)
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_MAX_TOKENS, DEFAULT_MERGE_MARGIN, DEFAULT_OVERLAP)
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Split `text` into chunks. Chunk order follows document order and the
    /// trailing buffer is always emitted.
    pub fn chunk(&self, text: &str) -> Result<Vec<String>, ChunkError> {
        validate_window(self.max_tokens, self.overlap)?;

        let total_tokens = count_tokens(text);
        if total_tokens <= self.max_tokens {
            return Ok(vec![text.to_string()]);
        }

        info!(
            tokens = total_tokens,
            max_tokens = self.max_tokens,
            "large document, splitting on headers"
        );

        let threshold = self.max_tokens + self.merge_margin;
        let mut chunks = Vec::new();
        let mut buffer = String::new();
        let mut buffer_tokens = 0;

        for section in split_sections(text) {
            let section_tokens = count_tokens(section);

            if buffer_tokens + section_tokens < threshold {
                if !buffer.is_empty() {
                    buffer.push('\n');
                }
                buffer.push_str(section);
                buffer_tokens += section_tokens;
            } else if section_tokens > threshold {
                if !buffer.is_empty() {
                    chunks.push(std::mem::take(&mut buffer));
                    buffer_tokens = 0;
                }
                let tokens: Vec<&str> = section.split_whitespace().collect();
                let windows = chunk_with_overlap(&tokens, self.max_tokens, self.overlap)?;
                debug!(
                    section_tokens,
                    windows = windows.len(),
                    "oversized section split into windows"
                );
                chunks.extend(windows);
            } else {
                if !buffer.is_empty() {
                    chunks.push(std::mem::take(&mut buffer));
                }
                buffer.push_str(section);
                buffer_tokens = section_tokens;
            }
        }

        if !buffer.is_empty() {
            chunks.push(buffer);
        }

        Ok(chunks)
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("t{i}")).collect()
    }

    fn words(prefix: &str, n: usize) -> String {
        (0..n)
            .map(|i| format!("{prefix}{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Recover each chunk's token window as (start, end) indices into `t0..tN`.
    fn windows_of(chunks: &[String]) -> Vec<(usize, usize)> {
        chunks
            .iter()
            .map(|c| {
                let toks: Vec<usize> = c
                    .split_whitespace()
                    .map(|t| t.trim_start_matches('t').parse().unwrap())
                    .collect();
                (toks[0], toks[toks.len() - 1] + 1)
            })
            .collect()
    }

    #[test]
    fn test_count_tokens() {
        assert_eq!(count_tokens(""), 0);
        assert_eq!(count_tokens("   \n\t "), 0);
        assert_eq!(count_tokens("one"), 1);
        assert_eq!(count_tokens("  one\ttwo\n\nthree  "), 3);
    }

    #[test]
    fn test_overlap_windows_scenario() {
        let owned = numbered(2000);
        let tokens: Vec<&str> = owned.iter().map(String::as_str).collect();

        let chunks = chunk_with_overlap(&tokens, 1024, 256).unwrap();

        assert_eq!(windows_of(&chunks), vec![(0, 1024), (768, 1792), (1536, 2000)]);
    }

    #[test]
    fn test_overlap_window_properties() {
        for len in [1usize, 5, 9, 10, 11, 37, 100, 101] {
            for (max, overlap) in [(10usize, 0usize), (10, 3), (10, 9), (1, 0), (7, 2)] {
                let owned = numbered(len);
                let tokens: Vec<&str> = owned.iter().map(String::as_str).collect();
                let chunks = chunk_with_overlap(&tokens, max, overlap).unwrap();
                let windows = windows_of(&chunks);

                let expected = if len <= max {
                    1
                } else {
                    (len - overlap).div_ceil(max - overlap)
                };
                assert_eq!(chunks.len(), expected, "len={len} max={max} overlap={overlap}");
                assert_eq!(windows.last().unwrap().1, len);

                let mut covered = vec![false; len];
                for (s, e) in &windows {
                    assert!(e - s <= max);
                    covered[*s..*e].iter_mut().for_each(|c| *c = true);
                }
                assert!(covered.iter().all(|c| *c));
            }
        }
    }

    #[test]
    fn test_overlap_short_input_single_chunk() {
        let chunks = chunk_with_overlap(&["a", "b", "c"], 1024, 256).unwrap();
        assert_eq!(chunks, vec!["a b c".to_string()]);
    }

    #[test]
    fn test_overlap_empty_input() {
        assert!(chunk_with_overlap(&[], 10, 2).unwrap().is_empty());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_window() {
        assert_eq!(
            chunk_with_overlap(&["a"], 4, 4),
            Err(ChunkError::InvalidConfiguration {
                max_tokens: 4,
                overlap: 4
            })
        );
        assert!(chunk_with_overlap(&["a"], 4, 9).is_err());
        assert!(chunk_with_overlap(&["a"], 0, 0).is_err());
    }

    #[test]
    fn test_short_document_unchanged() {
        let text = "# Title\n\nSome   spacing is\tkept.\n\n## Intro\nBody";
        let chunks = header_aware_chunk(text, 1024, 50).unwrap();
        assert_eq!(chunks, vec![text.to_string()]);
    }

    #[test]
    fn test_exactly_max_tokens_is_single_chunk() {
        let text = words("w", 1024);
        assert_eq!(header_aware_chunk(&text, 1024, 50).unwrap(), vec![text]);
    }

    #[test]
    fn test_split_sections() {
        let text = "preamble text\n# One\nbody one\n\n## Two\nbody two\n#### not a header\n###no space\n";
        let sections = split_sections(text);
        assert_eq!(
            sections,
            vec![
                "preamble text",
                "# One\nbody one",
                "## Two\nbody two\n#### not a header\n###no space",
            ]
        );
    }

    #[test]
    fn test_split_sections_drops_empty() {
        let sections = split_sections("\n\n  \n# A\n\n# B\nbody\n");
        assert_eq!(sections, vec!["# A", "# B\nbody"]);
    }

    #[test]
    fn test_header_scenario_300_1100_200() {
        // Header line contributes 2 tokens ("#" and the name).
        let s1 = format!("# First\n{}", words("a", 298));
        let s2 = format!("# Second\n{}", words("b", 1098));
        let s3 = format!("# Third\n{}", words("c", 198));
        let text = format!("{s1}\n{s2}\n{s3}");

        let chunks = header_aware_chunk(&text, 1024, 50).unwrap();

        // s1 flushed alone, s2 windowed (1100 tokens -> 2 windows), s3 trailing buffer.
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0], s1);
        assert_eq!(count_tokens(&chunks[1]), 1024);
        assert!(chunks[1].starts_with("# Second b0"));
        assert_eq!(count_tokens(&chunks[2]), 1100 - 768);
        assert!(chunks[2].ends_with("b1097"));
        assert_eq!(chunks[3], s3);
    }

    #[test]
    fn test_small_sections_merge() {
        let s1 = format!("# A\n{}", words("a", 398));
        let s2 = format!("## B\n{}", words("b", 398));
        let s3 = format!("## C\n{}", words("c", 398));
        let text = format!("{s1}\n{s2}\n{s3}");

        let chunks = header_aware_chunk(&text, 1024, 50).unwrap();

        // 400 + 400 = 800 < 1074, adding 400 more crosses it.
        assert_eq!(chunks, vec![format!("{s1}\n{s2}"), s3]);
    }

    #[test]
    fn test_section_at_threshold_starts_new_buffer() {
        // 1074 tokens equals the threshold: not oversized, but not mergeable either.
        let s1 = format!("# A\n{}", words("a", 8));
        let s2 = format!("# B\n{}", words("b", 1072));
        let s3 = format!("# C\n{}", words("c", 8));
        let text = format!("{s1}\n{s2}\n{s3}");

        let chunks = header_aware_chunk(&text, 1024, 50).unwrap();

        assert_eq!(chunks, vec![s1, s2, s3]);
    }

    #[test]
    fn test_trailing_buffer_is_flushed() {
        let text = format!("# A\n{}\n# B\n{}", words("a", 600), words("b", 600));
        let chunks = header_aware_chunk(&text, 1024, 50).unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].ends_with("b599"));
    }

    #[test]
    fn test_headerless_long_document_is_windowed() {
        let text = words("x", 2500);
        let chunks = header_aware_chunk(&text, 1024, 50).unwrap();
        assert_eq!(chunks.len(), 3);
        assert!(chunks.last().unwrap().ends_with("x2499"));
    }

    #[test]
    fn test_no_token_lost() {
        let text = format!(
            "intro {}\n# A\n{}\n## B\n{}\n### C\n{}",
            words("i", 50),
            words("a", 700),
            words("b", 1500),
            words("c", 90)
        );
        let chunks = TextChunker::with_defaults().chunk(&text).unwrap();
        let joined = chunks.join(" ");
        for token in text.split_whitespace() {
            assert!(joined.split_whitespace().any(|t| t == token), "missing {token}");
        }
    }

    #[test]
    fn test_chunker_rejects_bad_overlap_up_front() {
        let chunker = TextChunker::new(100, 10, 100);
        assert!(matches!(
            chunker.chunk("short"),
            Err(ChunkError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_from_config() {
        let config = IndexingConfig {
            max_tokens: 10,
            merge_margin: 0,
            overlap: 2,
            ..Default::default()
        };
        let chunker = TextChunker::from_config(&config);
        assert_eq!(chunker.max_tokens(), 10);
        let chunks = chunker.chunk(&words("w", 25)).unwrap();
        assert_eq!(chunks.len(), 3);
    }
}
