//! Brace scanner for notation blocks
//!
//! Block bodies are located by counting `{`/`}` depth from an opening brace.
//! Quoted strings, raw strings and `//` comments are skipped whole so that
//! braces inside them never change the depth. All positions are byte offsets
//! into the complete source, so line numbers in errors stay absolute.

use std::ops::Range;

use crate::error::{Result, ScenarioError};

/// 1-based line of a byte offset.
pub fn line_of(src: &str, offset: usize) -> usize {
    let offset = offset.min(src.len());
    src.as_bytes()[..offset].iter().filter(|&&b| b == b'\n').count() + 1
}

/// Skip whitespace and `//` comments, never past `end`.
pub fn skip_trivia(src: &str, mut pos: usize, end: usize) -> usize {
    loop {
        let rest = &src[pos..end];
        let trimmed = rest.trim_start();
        pos += rest.len() - trimmed.len();
        if trimmed.starts_with("//") {
            pos += trimmed.find('\n').unwrap_or(trimmed.len());
        } else {
            return pos;
        }
    }
}

/// Number of `#` in a raw string opener (`r"`, `r#"`, ...) at `pos`.
pub fn raw_string_hashes(src: &str, pos: usize) -> Option<usize> {
    let rest = &src[pos..];
    if !rest.starts_with('r') {
        return None;
    }
    if let Some(prev) = src[..pos].chars().next_back() {
        if prev.is_ascii_alphanumeric() || prev == '_' {
            return None;
        }
    }
    let hashes = rest[1..].chars().take_while(|&c| c == '#').count();
    rest[1 + hashes..].starts_with('"').then_some(hashes)
}

/// Byte length of the string literal starting at `pos`, if one starts there.
/// An unterminated literal runs to `end`.
pub fn literal_len(src: &str, pos: usize, end: usize) -> Option<usize> {
    let rest = &src[pos..end];

    if rest.starts_with('"') {
        let mut escaped = false;
        for (i, c) in rest.char_indices().skip(1) {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => return Some(i + 1),
                _ => {}
            }
        }
        return Some(rest.len());
    }

    let hashes = raw_string_hashes(src, pos)?;
    let body_start = 2 + hashes;
    let closing = format!("\"{}", "#".repeat(hashes));
    Some(match rest.get(body_start..).and_then(|body| body.find(&closing)) {
        Some(idx) => body_start + idx + closing.len(),
        None => rest.len(),
    })
}

/// Extract the body of the block whose `{` is at `open`.
///
/// Returns the inner range (between the braces) and the offset just past the
/// closing brace.
pub fn balanced_body(
    src: &str,
    open: usize,
    end: usize,
    block: &str,
) -> Result<(Range<usize>, usize)> {
    debug_assert!(src[open..].starts_with('{'));

    let mut depth = 0usize;
    let mut pos = open;

    while pos < end {
        if let Some(len) = literal_len(src, pos, end) {
            pos += len;
            continue;
        }
        let rest = &src[pos..end];
        if rest.starts_with("//") {
            pos += rest.find('\n').unwrap_or(rest.len());
            continue;
        }

        let Some(c) = rest.chars().next() else {
            break;
        };
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((open + 1..pos, pos + 1));
                }
            }
            _ => {}
        }
        pos += c.len_utf8();
    }

    Err(ScenarioError::UnbalancedBlock {
        block: block.to_string(),
        line: line_of(src, open),
    })
}
