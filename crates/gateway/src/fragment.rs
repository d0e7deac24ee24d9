//! Outbound reply fragmentation.
//!
//! The transport caps message size (1500 characters for WhatsApp, with
//! headroom under the provider's hard limit). Long replies are split at
//! the last whitespace boundary before the cap so no word is ever cut in
//! half; the separator stays at the end of the earlier fragment, which
//! makes plain concatenation of the fragments reproduce the original
//! text exactly. A single token longer than the cap (a URL, usually)
//! falls back to a hard cut.

/// Split `text` into fragments of at most `cap` characters each.
pub fn split(text: &str, cap: usize) -> Vec<String> {
    debug_assert!(cap > 0, "fragment cap must be positive");

    let mut fragments = Vec::new();
    let mut rest = text;

    loop {
        if rest.chars().count() <= cap {
            if !rest.is_empty() {
                fragments.push(rest.to_string());
            }
            break;
        }

        // Byte offset of the first character past the cap
        let cap_byte = rest
            .char_indices()
            .nth(cap)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let window = &rest[..cap_byte];

        // End of the last whitespace run inside the window
        let boundary = window
            .char_indices()
            .filter(|(_, c)| c.is_whitespace())
            .map(|(i, c)| i + c.len_utf8())
            .next_back();

        let cut = boundary.unwrap_or(cap_byte);
        fragments.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }

    fragments
}
