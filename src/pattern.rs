//! Redis-compatible glob matching for `keys` and `del_with_pattern`.
//!
//! Supported syntax:
//! - `*` matches any run of bytes, including none
//! - `?` matches exactly one byte
//! - `[abc]` matches one byte from the set, `[^abc]` one outside it
//! - `[a-z]` matches one byte in the (inclusive) range
//! - `\x` matches `x` literally
//!
//! Matching is per byte, as in Redis `KEYS`: `?` matches a single byte, so a
//! two-byte UTF-8 character like `é` needs `??`. Both backends agree on this.
//! An unterminated class (`[abc`) is closed implicitly at the end of the pattern.

/// Test whether `key` matches the glob `pattern`.
///
/// # Example
///
/// ```
/// use cache_contract::pattern::matches;
///
/// assert!(matches("user:*", "user:42"));
/// assert!(matches("h?llo", "hallo"));
/// assert!(matches("h[^e]llo", "hallo"));
/// assert!(!matches("h[^e]llo", "hello"));
/// ```
pub fn matches(pattern: &str, key: &str) -> bool {
    match_from(pattern.as_bytes(), key.as_bytes())
}

fn match_from(mut pattern: &[u8], mut key: &[u8]) -> bool {
    while let (Some(&p), Some(&c)) = (pattern.first(), key.first()) {
        match p {
            b'*' => {
                while pattern.len() > 1 && pattern[1] == b'*' {
                    pattern = &pattern[1..];
                }
                if pattern.len() == 1 {
                    return true;
                }
                return (0..key.len()).any(|i| match_from(&pattern[1..], &key[i..]));
            }
            b'?' => {
                key = &key[1..];
            }
            b'[' => {
                let (matched, rest) = match_class(&pattern[1..], c);
                if !matched {
                    return false;
                }
                // `rest` starts at the closing bracket (or is empty when unterminated).
                pattern = rest;
                key = &key[1..];
                if pattern.is_empty() {
                    break;
                }
            }
            b'\\' if pattern.len() >= 2 => {
                pattern = &pattern[1..];
                if pattern[0] != c {
                    return false;
                }
                key = &key[1..];
            }
            literal => {
                if literal != c {
                    return false;
                }
                key = &key[1..];
            }
        }

        pattern = &pattern[1..];
    }

    if key.is_empty() {
        while pattern.first() == Some(&b'*') {
            pattern = &pattern[1..];
        }
    }
    pattern.is_empty() && key.is_empty()
}

/// Evaluate a character class body (the part after `[`) against byte `c`.
///
/// Returns whether `c` is accepted and the pattern positioned on the closing `]`.
/// For an unterminated class the returned slice is empty.
fn match_class(mut pattern: &[u8], c: u8) -> (bool, &[u8]) {
    let negate = pattern.first() == Some(&b'^');
    if negate {
        pattern = &pattern[1..];
    }

    let mut matched = false;
    loop {
        match pattern {
            [] => break,
            [b']', ..] => break,
            [b'\\', escaped, ..] => {
                if *escaped == c {
                    matched = true;
                }
                pattern = &pattern[2..];
            }
            [start, b'-', end, ..] => {
                let (lo, hi) = if start <= end {
                    (*start, *end)
                } else {
                    (*end, *start)
                };
                if lo <= c && c <= hi {
                    matched = true;
                }
                pattern = &pattern[3..];
            }
            [single, ..] => {
                if *single == c {
                    matched = true;
                }
                pattern = &pattern[1..];
            }
        }
    }

    (matched != negate, pattern)
}

#[cfg(test)]
mod tests {
    use super::matches;

    #[test]
    fn test_literal() {
        assert!(matches("key", "key"));
        assert!(!matches("key", "keys"));
        assert!(!matches("keys", "key"));
        assert!(matches("", ""));
        assert!(!matches("", "a"));
    }

    #[test]
    fn test_star() {
        assert!(matches("*", ""));
        assert!(matches("*", "anything"));
        assert!(matches("key*", "key"));
        assert!(matches("key*", "key-a"));
        assert!(!matches("key*", "other"));
        assert!(matches("*:session", "user:1:session"));
        assert!(matches("a**b", "axxb"));
        assert!(matches("a*b*c", "a-b-c"));
        assert!(!matches("a*b*c", "a-b-"));
    }

    #[test]
    fn test_question_mark() {
        assert!(matches("temp:???", "temp:abc"));
        assert!(!matches("temp:???", "temp:ab"));
        assert!(!matches("temp:???", "temp:abcd"));
    }

    #[test]
    fn test_multibyte_keys_match_per_byte() {
        // "é" is two bytes in UTF-8
        assert!(!matches("?", "é"));
        assert!(matches("??", "é"));
        assert!(matches("caf??", "café"));
        assert!(matches("caf*", "café"));
        assert!(matches("café", "café"));
        assert!(!matches("[é]", "é"));
    }

    #[test]
    fn test_classes() {
        assert!(matches("h[ae]llo", "hello"));
        assert!(matches("h[ae]llo", "hallo"));
        assert!(!matches("h[ae]llo", "hillo"));
        assert!(matches("h[^e]llo", "hallo"));
        assert!(!matches("h[^e]llo", "hello"));
        assert!(matches("cache:[0-9]*", "cache:7-old"));
        assert!(!matches("cache:[0-9]*", "cache:x"));
        assert!(matches("[z-a]", "m"));
    }

    #[test]
    fn test_escapes() {
        assert!(matches(r"star\*", "star*"));
        assert!(!matches(r"star\*", "starfish"));
        assert!(matches(r"[\]]", "]"));
        assert!(matches(r"trailing\", r"trailing\"));
    }

    #[test]
    fn test_unterminated_class() {
        assert!(matches("[abc", "b"));
        assert!(!matches("[abc", "d"));
    }
}
