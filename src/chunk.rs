//! Overlapping character-window chunker with page provenance.
//!
//! Splits each page's text into windows of at most `chunk_size` characters
//! with exactly `overlap` characters shared between consecutive windows of
//! the same page. A window prefers to end at a paragraph break, then a
//! line break, then a sentence end, then a word boundary, before falling
//! back to a hard character cut.
//!
//! Two invariants hold for every page that produces chunks:
//!
//! - Adjacent windows share exactly `overlap` characters: window `i+1`
//!   starts `overlap` characters before window `i` ends.
//! - Concatenating window 0 with the `[overlap..]` character suffix of
//!   every later window reconstructs the page text exactly. Nothing is
//!   dropped or duplicated outside the overlap band.
//!
//! All sizes are measured in characters, not bytes, so multi-byte UTF-8
//! text windows correctly.

use crate::error::PipelineError;
use crate::models::{Chunk, DocumentPage};

/// Default window size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default overlap between consecutive windows, in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Split extracted pages into overlapping chunks.
///
/// Pages whose text is entirely whitespace yield no chunks. `chunk_index`
/// is contiguous from 0 across the whole document, in page order.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidDocument`] when no page yields any
/// chunk — a scanned or image-only PDF must surface as "no content to
/// index", never as a silently empty index.
pub fn chunk_pages(
    pages: &[DocumentPage],
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<Chunk>, PipelineError> {
    let mut chunks: Vec<Chunk> = Vec::new();

    for page in pages {
        if page.text.trim().is_empty() {
            continue;
        }
        for text in chunk_page(&page.text, chunk_size, overlap) {
            chunks.push(Chunk {
                text,
                page: Some(page.number),
                chunk_index: chunks.len(),
            });
        }
    }

    if chunks.is_empty() {
        return Err(PipelineError::InvalidDocument(
            "no extractable text in any page; nothing to index".to_string(),
        ));
    }

    Ok(chunks)
}

/// Window a single page's text. Returns the window texts in order.
fn chunk_page(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    // A window must extend past the overlap band to make progress.
    let overlap = overlap.min(chunk_size.saturating_sub(1));

    let chars: Vec<char> = text.chars().collect();
    // Byte offset of every char, plus one past the end, so windows can
    // slice the original string without re-walking it.
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let total = chars.len();

    if total == 0 {
        return Vec::new();
    }

    let mut windows = Vec::new();
    let mut start = 0usize;

    loop {
        let ideal_end = (start + chunk_size).min(total);
        let end = if ideal_end == total {
            total
        } else {
            find_break(&chars, start + overlap + 1, ideal_end)
        };

        windows.push(text[offsets[start]..offsets[end]].to_string());

        if end == total {
            break;
        }
        start = end - overlap;
    }

    windows
}

/// Pick the window end in `[floor, ideal_end]`, preferring natural breaks.
///
/// The returned position is one past the separator, so the separator
/// stays in the current window. Falls back to `ideal_end` (hard cut)
/// when no acceptable boundary exists.
fn find_break(chars: &[char], floor: usize, ideal_end: usize) -> usize {
    if floor > ideal_end {
        return ideal_end;
    }

    // Paragraph break: "\n\n" ending at the candidate position.
    for end in (floor..=ideal_end).rev() {
        if end >= 2 && chars[end - 1] == '\n' && chars[end - 2] == '\n' {
            return end;
        }
    }
    // Line break.
    for end in (floor..=ideal_end).rev() {
        if chars[end - 1] == '\n' {
            return end;
        }
    }
    // Sentence end followed by whitespace.
    for end in (floor..=ideal_end).rev() {
        if end >= 2
            && matches!(chars[end - 2], '.' | '!' | '?')
            && chars[end - 1].is_whitespace()
        {
            return end;
        }
    }
    // Word boundary.
    for end in (floor..=ideal_end).rev() {
        if chars[end - 1] == ' ' {
            return end;
        }
    }

    ideal_end
}
