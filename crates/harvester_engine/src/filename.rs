use sha2::{Digest, Sha256};

const MAX_STEM_CHARS: usize = 80;

/// Windows-safe, deterministic checkpoint name:
/// `{sanitized_id}--{short_hash(id)}.checkpoint.json`.
///
/// The hash keeps ids that sanitize to the same stem apart.
pub fn checkpoint_filename(source_id: &str) -> String {
    let stem = output_stem(source_id);
    let hash = short_hash(source_id);
    format!("{stem}--{hash}.checkpoint.json")
}

/// Filesystem-safe stem derived from a source id, used as the default
/// output prefix.
pub fn output_stem(source_id: &str) -> String {
    let mut cleaned: String = source_id
        .chars()
        .map(|c| if is_forbidden(c) || c.is_whitespace() { '_' } else { c })
        .collect();
    cleaned = cleaned.trim_matches(&['_', '.'][..]).to_string();
    if cleaned.is_empty() {
        cleaned = "source".to_string();
    }
    // Collapse multiple underscores
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }
    // Cut on a char boundary; source ids are often non-ASCII.
    let mut stem: String = compacted.chars().take(MAX_STEM_CHARS).collect();
    if is_reserved_windows_name(&stem) {
        stem.push('_');
    }
    stem
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
