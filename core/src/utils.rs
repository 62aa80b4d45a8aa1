//! Utility functions and types.

use std::fmt::Debug;
use std::fmt::Display;

/// Redacts a string by replacing all but the first and last three characters with asterisks.
///
/// - If the input string has fewer than 12 characters, it should be entirely redacted.
/// - If the input string has 12 or more characters, only the first three and the last three.
///
/// This design is to allow users to distinguish between different redacted strings but avoid
/// leaking sensitive information.
pub struct Redact<'a>(&'a str);

impl<'a> From<&'a str> for Redact<'a> {
    fn from(value: &'a str) -> Self {
        Redact(value)
    }
}

impl<'a> From<&'a String> for Redact<'a> {
    fn from(value: &'a String) -> Self {
        Redact(value.as_str())
    }
}

impl<'a> From<&'a Option<String>> for Redact<'a> {
    fn from(value: &'a Option<String>) -> Self {
        match value {
            None => Redact(""),
            Some(v) => Redact(v),
        }
    }
}

impl Debug for Redact<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let length = self.0.chars().count();
        if length == 0 {
            return f.write_str("EMPTY");
        }
        if length < 12 {
            return f.write_str("***");
        }

        // Boundaries are char indices, multi-byte input must not be split.
        let head = self.0.char_indices().nth(3).map_or(0, |(idx, _)| idx);
        let tail = self
            .0
            .char_indices()
            .nth(length - 3)
            .map_or(self.0.len(), |(idx, _)| idx);
        f.write_str(&self.0[..head])?;
        f.write_str("***")?;
        f.write_str(&self.0[tail..])
    }
}

/// Masks a secret down to a short leading prefix for diagnostics.
///
/// Only the first `n` characters are kept, followed by `...`. Secrets that
/// are not longer than `n` are fully hidden so the prefix never equals the
/// secret itself.
pub struct Masked<'a> {
    value: &'a str,
    prefix: usize,
}

impl<'a> Masked<'a> {
    /// Keep the first `prefix` characters of `value`.
    pub fn new(value: &'a str, prefix: usize) -> Self {
        Self { value, prefix }
    }
}

impl Display for Masked<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.value.chars().count() <= self.prefix {
            return f.write_str("***");
        }

        let end = self
            .value
            .char_indices()
            .nth(self.prefix)
            .map(|(idx, _)| idx)
            .unwrap_or(self.value.len());
        f.write_str(&self.value[..end])?;
        f.write_str("...")
    }
}

impl Debug for Masked<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact() {
        let cases = vec![
            ("Short", "***"),
            ("Hello World!", "Hel***ld!"),
            ("This is a longer string", "Thi***ing"),
            ("", "EMPTY"),
            ("HelloWorld", "***"),
            ("ключ-секрет-значение", "клю***ние"),
            ("日本語の秘密の鍵です", "***"),
            ("€€€-account-key-€€€", "€€€***€€€"),
        ];

        for (input, expected) in cases {
            assert_eq!(
                format!("{:?}", Redact(input)),
                expected,
                "Failed on input: {}",
                input
            );
        }
    }

    #[test]
    fn test_masked() {
        let cases = vec![
            ("dGVzdGtleQ==", 5, "dGVzd..."),
            ("sv=2021-06-08&ss=b&srt=sco", 10, "sv=2021-06..."),
            ("short", 5, "***"),
            ("", 5, "***"),
            ("ключ-секрет", 4, "ключ..."),
        ];

        for (input, prefix, expected) in cases {
            assert_eq!(
                Masked::new(input, prefix).to_string(),
                expected,
                "Failed on input: {}",
                input
            );
        }
    }
}
