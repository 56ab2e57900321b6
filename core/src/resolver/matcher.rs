//! Exact port matching in tool output.

use regex::Regex;

/// Matches a port number as a whole address component.
///
/// The port must be preceded by `:` or whitespace and followed by
/// whitespace (including tab and CR) or the end of the line, so `80`
/// never matches inside `8080` or `:801`.
pub(crate) struct PortPattern {
    regex: Regex,
}

impl PortPattern {
    pub(crate) fn new(port: u16) -> Self {
        let regex = Regex::new(&format!(r"[:\s]{}(?:\s|$)", port)).unwrap();
        Self { regex }
    }

    pub(crate) fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }

    /// First line whose address matches, preferring one that contains `preferred`.
    ///
    /// `address_of` picks the text to match from each line; lines it
    /// rejects are skipped.
    pub(crate) fn find_line<'a, F>(
        &self,
        output: &'a str,
        address_of: F,
        preferred: Option<&str>,
    ) -> Option<&'a str>
    where
        F: Fn(&'a str) -> Option<&'a str>,
    {
        let mut first = None;
        let matching = output
            .lines()
            .filter(|line| address_of(*line).is_some_and(|addr| self.is_match(addr)));

        for line in matching {
            match preferred {
                Some(marker) if line.contains(marker) => return Some(line),
                Some(_) => {
                    first.get_or_insert(line);
                }
                None => return Some(line),
            }
        }
        first
    }
}
