//! Header-aware markdown chunker.
//!
//! Splits policy document text into bounded chunks while keeping each
//! chunk self-describing: a chunk split out of a long "3.2 Access Control"
//! section still starts with that heading, which materially improves
//! retrieval precision for structured policy documents.
//!
//! # Algorithm
//!
//! 1. Split on section boundaries: a newline immediately followed by an
//!    H1–H3 marker (`#`, `##`, or `###` plus a space). Each section keeps
//!    its header line; the first section may be headerless prose.
//! 2. Sections at or below [`MAX_CHUNK_CHARS`] are emitted verbatim.
//! 3. Oversized sections are split on blank-line paragraph boundaries.
//!    Paragraphs accumulate into a running chunk seeded with the section's
//!    first line; when appending a paragraph would exceed the budget, the
//!    running chunk is closed (kept if longer than [`MIN_CHUNK_CHARS`])
//!    and a new one starts with the header re-prefixed.
//! 4. Any chunk shorter than [`MIN_CHUNK_CHARS`] is dropped as noise.
//!
//! The upper bound is soft: a single paragraph larger than the budget is
//! never split mid-paragraph, so the chunk carrying it may exceed the cap.

/// Soft upper bound on chunk length, in bytes.
pub const MAX_CHUNK_CHARS: usize = 1000;

/// Chunks at or below this length are dropped as context-free noise.
pub const MIN_CHUNK_CHARS: usize = 100;

/// Split markdown text into bounded, header-prefixed chunks.
///
/// Deterministic and total: any input (including empty or whitespace-only
/// text) returns without error, possibly with an empty result. Chunks are
/// returned in document order.
pub fn chunk_markdown(text: &str) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();

    for section in split_sections(text) {
        let section = section.trim();
        if section.is_empty() {
            continue;
        }

        // Small enough to stand alone (boundary is inclusive).
        if section.len() <= MAX_CHUNK_CHARS {
            chunks.push(section.to_string());
            continue;
        }

        // Oversized: first line is the header context carried into every
        // continuation chunk.
        let (header, rest) = section.split_once('\n').unwrap_or((section, ""));
        let mut current = header.to_string();

        for paragraph in rest.split("\n\n") {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }

            if current.len() + paragraph.len() + 2 > MAX_CHUNK_CHARS {
                if current.len() > MIN_CHUNK_CHARS {
                    chunks.push(current.trim().to_string());
                }
                current = format!("{header}\n\n{paragraph}");
            } else {
                current.push_str("\n\n");
                current.push_str(paragraph);
            }
        }

        if current.len() > MIN_CHUNK_CHARS {
            chunks.push(current.trim().to_string());
        }
    }

    chunks.retain(|c| c.len() >= MIN_CHUNK_CHARS);
    chunks
}

/// Split text on newlines immediately followed by an H1–H3 header marker,
/// so each section begins with its header line.
fn split_sections(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut sections = Vec::new();
    let mut start = 0;

    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\n' && is_header_line(&text[i + 1..]) {
            sections.push(&text[start..i]);
            start = i + 1;
        }
    }
    sections.push(&text[start..]);
    sections
}

/// True when `s` starts with one to three `#` characters followed by a
/// space. Four or more `#` (H4+) is not a section boundary.
fn is_header_line(s: &str) -> bool {
    let hashes = s.bytes().take_while(|&b| b == b'#').count();
    (1..=3).contains(&hashes) && s.as_bytes().get(hashes) == Some(&b' ')
}
