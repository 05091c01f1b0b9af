//! Anchored route patterns.

use std::borrow::Cow;

use regex::Regex;
use strata_core::CaptureMap;

use crate::{Result, RouterBuildError};

/// A compiled route pattern that only matches whole strings.
///
/// The pattern is wrapped as `^(?:<pattern>)$`, so `me` does not match
/// `meet` and `a|b` does not match `ab`. Named groups (`(?P<name>...)`) become
/// percent-decoded path captures.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    source: String,
    regex: Regex,
}

impl RoutePattern {
    /// Compiles `pattern`.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex =
            Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
                RouterBuildError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                }
            })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Returns the pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns `true` if the whole of `text` matches.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Matches `text` and returns its named captures, percent-decoded.
    ///
    /// Named groups that did not participate in the match are omitted.
    #[must_use]
    pub fn captures(&self, text: &str) -> Option<CaptureMap> {
        let caps = self.regex.captures(text)?;
        let mut matches = CaptureMap::new();
        for name in self.regex.capture_names().flatten() {
            if let Some(m) = caps.name(name) {
                matches.insert(name.to_string(), percent_decode(m.as_str()));
            }
        }
        Some(matches)
    }
}

fn percent_decode(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => match urlencoding::decode_binary(raw.as_bytes()) {
            Cow::Borrowed(b) => String::from_utf8_lossy(b).into_owned(),
            Cow::Owned(b) => String::from_utf8_lossy(&b).into_owned(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchored_both_ends() {
        let p = RoutePattern::new("me").unwrap();
        assert!(p.is_match("me"));
        assert!(!p.is_match("meet"));
        assert!(!p.is_match("xme"));
    }

    #[test]
    fn test_alternation_anchored() {
        let p = RoutePattern::new("a|b").unwrap();
        assert!(p.is_match("a"));
        assert!(p.is_match("b"));
        assert!(!p.is_match("ab"));
    }

    #[test]
    fn test_explicit_anchors_tolerated() {
        let p = RoutePattern::new(r"^ping/(?P<timestamp>\d+)$").unwrap();
        let caps = p.captures("ping/1234").unwrap();
        assert_eq!(caps.get("timestamp").map(String::as_str), Some("1234"));
    }

    #[test]
    fn test_captures_percent_decoded_once() {
        let p = RoutePattern::new("ping(?P<g>.*)").unwrap();
        let caps = p.captures("ping%26io").unwrap();
        assert_eq!(caps["g"], "&io");

        // "%2526" decodes to "%26", not to "&".
        let caps = p.captures("ping%2526").unwrap();
        assert_eq!(caps["g"], "%26");
    }

    #[test]
    fn test_plus_is_not_a_space() {
        let p = RoutePattern::new("(?P<q>.*)").unwrap();
        assert_eq!(p.captures("a+b").unwrap()["q"], "a+b");
    }

    #[test]
    fn test_invalid_utf8_escape_is_lossy() {
        let p = RoutePattern::new("(?P<q>.*)").unwrap();
        assert_eq!(p.captures("%FF").unwrap()["q"], "\u{FFFD}");
    }

    #[test]
    fn test_unmatched_optional_group_omitted() {
        let p = RoutePattern::new("item(/(?P<id>\\d+))?").unwrap();
        assert!(p.captures("item").unwrap().is_empty());
        assert_eq!(p.captures("item/7").unwrap()["id"], "7");
    }

    #[test]
    fn test_invalid_pattern() {
        let err = RoutePattern::new("(unclosed").unwrap_err();
        assert!(matches!(err, RouterBuildError::InvalidPattern { .. }));
        assert!(err.to_string().contains("(unclosed"));
    }
}
