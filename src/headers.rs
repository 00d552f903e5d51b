//! HTTP header map
//!
//! An ordered multi-value header map. Names keep the case they were given
//! and entries keep first-appearance order; lookups are case-insensitive.

use std::fmt;

/// Ordered header map: name -> sequence of values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
}

impl Headers {
    /// Create a new empty header map
    pub fn new() -> Self {
        Headers {
            entries: Vec::new(),
        }
    }

    /// Append a value to a header, creating the entry if needed
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        match self.entry_mut(&name) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// Replace all values of a header
    ///
    /// An existing entry keeps its position but takes the new name spelling
    /// and values; otherwise a new entry is appended.
    pub fn set(&mut self, name: impl Into<String>, values: Vec<String>) {
        let name = name.into();

        match self.entry_mut(&name) {
            Some(entry) => *entry = (name, values),
            None => self.entries.push((name, values)),
        }
    }

    /// Get the first value of a header (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).and_then(|v| v.first()).map(|v| v.as_str())
    }

    /// Get all values of a header (case-insensitive)
    pub fn get_all(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_slice())
    }

    /// Check if a header exists
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// Remove a header, returning whether it existed
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.entries.len() != before
    }

    /// Number of distinct header names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    /// Format every entry as an outgoing header line
    ///
    /// Multi-value headers are joined with `", "`:
    /// `("Accept", ["a", "b"])` becomes `"Accept: a, b"`.
    pub fn to_lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(name, values)| format!("{}: {}", name, values.join(", ")))
            .collect()
    }

    /// Parse a raw header block into a map
    ///
    /// Lines are split on `newline`, trimmed, and kept only when non-empty
    /// and containing a colon; this drops the status line and blank
    /// separators. Each kept line splits on the first colon, the value is
    /// trimmed and split on `", "` into individual values. A later line
    /// with an already-seen name replaces the earlier values.
    pub fn parse_block(block: &str, newline: &str) -> Headers {
        let mut headers = Headers::new();

        for line in block.split(newline) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };

            let values = value
                .trim()
                .split(", ")
                .map(|v| v.to_string())
                .collect::<Vec<_>>();
            headers.set(name, values);
        }

        headers
    }

    fn entry_mut(&mut self, name: &str) -> Option<&mut (String, Vec<String>)> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.to_lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CRLF, LF};

    #[test]
    fn test_append_and_get() {
        let mut headers = Headers::new();
        headers.append("Content-Type", "text/html");
        headers.append("Accept", "text/plain");
        headers.append("Accept", "application/json");

        assert_eq!(headers.get("Content-Type"), Some("text/html"));
        assert_eq!(
            headers.get_all("Accept").unwrap(),
            &["text/plain".to_string(), "application/json".to_string()]
        );
        assert_eq!(headers.get("Missing"), None);
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let mut headers = Headers::new();
        headers.append("Content-Type", "text/html");

        assert_eq!(headers.get("content-type"), Some("text/html"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/html"));
        assert!(headers.contains("CoNtEnT-TyPe"));
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut headers = Headers::new();
        headers.append("A", "1");
        headers.append("B", "2");
        headers.set("a", vec!["3".to_string()]);

        let collected: Vec<_> = headers.iter().collect();
        assert_eq!(collected[0].0, "a");
        assert_eq!(collected[0].1, &["3".to_string()]);
        assert_eq!(collected[1].0, "B");
    }

    #[test]
    fn test_to_lines_joins_values() {
        let mut headers = Headers::new();
        headers.append("Accept", "text/plain");
        headers.append("Accept", "application/json");
        headers.append("Host", "example.com");

        assert_eq!(
            headers.to_lines(),
            vec![
                "Accept: text/plain, application/json".to_string(),
                "Host: example.com".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_block_crlf() {
        let block = "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nAccept: a, b\r\n\r\n";
        let headers = Headers::parse_block(block, CRLF);

        // Status line has no colon and is dropped
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(
            headers.get_all("Accept").unwrap(),
            &["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_parse_block_lf() {
        let block = "HTTP/1.0 404 Not Found\nX-One: 1\nX-Two: 2\n";
        let headers = Headers::parse_block(block, LF);

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("X-One"), Some("1"));
        assert_eq!(headers.get("X-Two"), Some("2"));
    }

    #[test]
    fn test_parse_block_duplicate_overwrites() {
        let block = "Set-Cookie: a=1\r\nSet-Cookie: b=2\r\n";
        let headers = Headers::parse_block(block, CRLF);

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get_all("Set-Cookie").unwrap(), &["b=2".to_string()]);
    }

    #[test]
    fn test_parse_block_trims_value() {
        let headers = Headers::parse_block("X-Pad:    spaced out   \r\n", CRLF);
        assert_eq!(headers.get("X-Pad"), Some("spaced out"));
    }

    #[test]
    fn test_format_then_parse_round_trip() {
        let mut headers = Headers::new();
        headers.append("Content-Type", "text/plain");
        headers.append("Accept", "text/html");
        headers.append("Accept", "application/json");
        headers.append("X-Custom", "one");

        let block = format!("HTTP/1.1 200 OK\r\n{}\r\n", headers.to_lines().join(CRLF));
        let parsed = Headers::parse_block(&block, CRLF);

        assert_eq!(parsed, headers);
    }
}
