//! Version negotiation codec.
//!
//! Clients select an API, a version of it and an operating mode with a
//! single token of the form `<api>-<version>+<mode>`, carried in the
//! `X-DigiTar-API-Version` header or in a query parameter of the same name.
//! The header wins when both are present.
//!
//! ```
//! use strata_core::negotiation::decode;
//!
//! let token = decode(Some("MyAPI-1.0+PROD")).unwrap();
//! assert_eq!(token.api, "myapi");
//! assert_eq!(token.version, "1.0");
//! assert_eq!(token.mode, "prod");
//!
//! // No token at all is a valid, unversioned result.
//! assert!(decode(None).unwrap().is_unversioned());
//!
//! // A present token without separators is malformed.
//! assert!(decode(Some("myapi")).is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Header carrying the negotiation token (lower-case wire form).
pub const VERSION_HEADER: &str = "x-digitar-api-version";

/// Query parameter carrying the negotiation token.
pub const VERSION_QUERY_PARAM: &str = "X-DigiTar-API-Version";

/// The decoded `{api, version, mode}` triple.
///
/// All three fields are empty when the request carried no token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VersionToken {
    /// Lower-cased API name.
    pub api: String,
    /// Version string, taken verbatim.
    pub version: String,
    /// Lower-cased mode.
    pub mode: String,
}

impl VersionToken {
    /// Returns `true` if the request carried no token.
    #[must_use]
    pub fn is_unversioned(&self) -> bool {
        self.api.is_empty() && self.version.is_empty() && self.mode.is_empty()
    }

    /// Returns the mode if it is one of the recognised values.
    #[must_use]
    pub fn api_mode(&self) -> Option<ApiMode> {
        self.mode.parse().ok()
    }

    /// Renders the token back to its wire form.
    #[must_use]
    pub fn encode(&self) -> String {
        encode(&self.api, &self.version, &self.mode)
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Failure to decode a token that was present but malformed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NegotiationError {
    /// The token has no `-` between API name and version.
    #[error("version token '{0}' has no '-' separator")]
    MissingApiSeparator(String),

    /// The token has no `+` between version and mode.
    #[error("version token '{0}' has no '+' separator")]
    MissingModeSeparator(String),
}

impl NegotiationError {
    /// Returns the raw token that failed to decode.
    #[must_use]
    pub fn token(&self) -> &str {
        match self {
            Self::MissingApiSeparator(t) | Self::MissingModeSeparator(t) => t,
        }
    }
}

/// Operating mode selected by the `+<mode>` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiMode {
    /// Test mode.
    Test,
    /// Production mode.
    Prod,
}

impl ApiMode {
    /// Returns the wire form of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Prod => "prod",
        }
    }
}

impl FromStr for ApiMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "test" => Ok(Self::Test),
            "prod" => Ok(Self::Prod),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ApiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decodes a raw negotiation token.
///
/// `None` and the empty string are treated as "no token" and yield an
/// all-empty [`VersionToken`]. Only the first `-`-separated segment after the
/// API name is considered, and within it only the text up to the second `+`.
pub fn decode(raw: Option<&str>) -> Result<VersionToken, NegotiationError> {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(VersionToken::default()),
    };

    let mut segments = raw.split('-');
    let api = segments.next().unwrap_or_default();
    let tail = segments
        .next()
        .ok_or_else(|| NegotiationError::MissingApiSeparator(raw.to_string()))?;

    let mut parts = tail.split('+');
    let version = parts.next().unwrap_or_default();
    let mode = parts
        .next()
        .ok_or_else(|| NegotiationError::MissingModeSeparator(raw.to_string()))?;

    Ok(VersionToken {
        api: api.to_lowercase(),
        version: version.to_string(),
        mode: mode.to_lowercase(),
    })
}

/// Builds a wire token from its parts.
#[must_use]
pub fn encode(api: &str, version: &str, mode: &str) -> String {
    format!("{api}-{version}+{mode}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_full_token() {
        let token = decode(Some("dummy_api-1.0+prod")).unwrap();
        assert_eq!(token.api, "dummy_api");
        assert_eq!(token.version, "1.0");
        assert_eq!(token.mode, "prod");
        assert_eq!(token.api_mode(), Some(ApiMode::Prod));
    }

    #[test]
    fn test_decode_lowercases_api_and_mode_only() {
        let token = decode(Some("MyAPI-1.0RC+TEST")).unwrap();
        assert_eq!(token.api, "myapi");
        assert_eq!(token.version, "1.0RC");
        assert_eq!(token.mode, "test");
    }

    #[test]
    fn test_decode_absent() {
        assert_eq!(decode(None).unwrap(), VersionToken::default());
        assert!(decode(Some("")).unwrap().is_unversioned());
    }

    #[test]
    fn test_decode_missing_dash() {
        let err = decode(Some("dummyapi")).unwrap_err();
        assert_eq!(err, NegotiationError::MissingApiSeparator("dummyapi".into()));
        assert_eq!(err.token(), "dummyapi");
    }

    #[test]
    fn test_decode_missing_plus() {
        let err = decode(Some("dummyapi-1.0")).unwrap_err();
        assert!(matches!(err, NegotiationError::MissingModeSeparator(_)));
    }

    #[test]
    fn test_decode_only_second_segment_counts() {
        // "my-api-1.0+prod" puts "api" in the version slot, which has no '+'.
        assert!(decode(Some("my-api-1.0+prod")).is_err());
        let token = decode(Some("api-1.0+prod+extra")).unwrap();
        assert_eq!(token.mode, "prod");
    }

    #[test]
    fn test_unknown_mode_decodes() {
        let token = decode(Some("api-1.0+staging")).unwrap();
        assert_eq!(token.mode, "staging");
        assert_eq!(token.api_mode(), None);
    }

    #[test]
    fn test_display_round_trip() {
        let token = decode(Some("api-2.1+test")).unwrap();
        assert_eq!(token.to_string(), "api-2.1+test");
    }

    proptest! {
        #[test]
        fn prop_decode_recovers_fields(
            api in "[a-zA-Z_][a-zA-Z0-9_]{0,12}",
            version in "[0-9]{1,3}(\\.[0-9]{1,3}){0,2}",
            mode in "(test|prod|TEST|Prod)",
        ) {
            let token = decode(Some(&encode(&api, &version, &mode))).unwrap();
            prop_assert_eq!(token.api, api.to_lowercase());
            prop_assert_eq!(token.version, version);
            prop_assert_eq!(token.mode, mode.to_lowercase());
        }
    }
}
