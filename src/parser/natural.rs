//! Natural ("human") ordering for titles such as `Show 2` < `Show 10`.

use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    /// Digit run with leading zeros removed, so `"007"` and `"7"` compare equal.
    Number(String),
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort key made of alternating lowercased text and numeric runs.
///
/// Keys always start with a (possibly empty) text segment, so two keys compare
/// text-to-text and number-to-number at every position.
///
/// ```rust
/// use moonarr::parser::NaturalKey;
///
/// assert!(NaturalKey::new("Show 10") > NaturalKey::new("Show 2"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NaturalKey(Vec<Segment>);

impl NaturalKey {
    #[must_use]
    pub fn new(s: &str) -> Self {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut digits = String::new();

        for c in s.chars() {
            if c.is_ascii_digit() {
                digits.push(c);
                continue;
            }
            if !digits.is_empty() {
                segments.push(Segment::Text(std::mem::take(&mut text)));
                segments.push(Segment::Number(strip_zeros(&digits)));
                digits.clear();
            }
            text.extend(c.to_lowercase());
        }

        segments.push(Segment::Text(text));
        if !digits.is_empty() {
            segments.push(Segment::Number(strip_zeros(&digits)));
            segments.push(Segment::Text(String::new()));
        }

        Self(segments)
    }
}

fn strip_zeros(digits: &str) -> String {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    NaturalKey::new(a).cmp(&NaturalKey::new(b))
}
