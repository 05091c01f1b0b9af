//! Signed, timestamped cookies.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use http::header::{COOKIE, SET_COOKIE};
use http::HeaderValue;
use sha1::Sha1;
use strata_core::RequestContext;

use crate::CookieError;

type HmacSha1 = Hmac<Sha1>;

const SECONDS_PER_DAY: i64 = 86_400;

/// Attributes of a cookie written by [`SecureCookies::set_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    /// Days until the browser discards the cookie.
    pub expires_days: i64,
    /// Cookie path.
    pub path: String,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            expires_days: 30,
            path: "/".to_string(),
        }
    }
}

/// Signs and verifies cookie values.
///
/// A cookie value has the form `base64(value)|timestamp|signature`, where
/// the signature is the hex HMAC-SHA1 of the encoded value followed by the
/// timestamp. New cookies are signed with the first secret; a cookie is
/// accepted if any secret reproduces its signature.
#[derive(Clone)]
pub struct SecureCookies {
    keys: Vec<HmacSha1>,
}

impl SecureCookies {
    /// Default maximum age accepted by [`get`](Self::get), in days.
    pub const DEFAULT_EXPIRY_DAYS: i64 = 31;

    /// Creates a signer from an ordered list of secrets.
    pub fn new<I, S>(secrets: I) -> Result<Self, CookieError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let keys = secrets
            .into_iter()
            .map(|secret| {
                <HmacSha1 as Mac>::new_from_slice(secret.as_ref())
                    .map_err(|_| CookieError::InvalidSecret)
            })
            .collect::<Result<Vec<_>, _>>()?;
        if keys.is_empty() {
            return Err(CookieError::NoSecrets);
        }
        Ok(Self { keys })
    }

    /// Appends a signed `Set-Cookie` header using the default attributes.
    pub fn set(
        &self,
        ctx: &mut RequestContext,
        name: &str,
        value: &[u8],
    ) -> Result<(), CookieError> {
        self.set_with(ctx, name, value, &CookieOptions::default())
    }

    /// Appends a signed `Set-Cookie` header.
    ///
    /// Fails with [`CookieError::ExpiryOutOfRange`] when `expires_days` puts
    /// the expiry date outside the representable range.
    pub fn set_with(
        &self,
        ctx: &mut RequestContext,
        name: &str,
        value: &[u8],
        options: &CookieOptions,
    ) -> Result<(), CookieError> {
        self.set_at(ctx, name, value, options, Utc::now())
    }

    fn set_at(
        &self,
        ctx: &mut RequestContext,
        name: &str,
        value: &[u8],
        options: &CookieOptions,
        now: DateTime<Utc>,
    ) -> Result<(), CookieError> {
        let out_of_range = || CookieError::ExpiryOutOfRange {
            days: options.expires_days,
        };
        let expires = Duration::try_days(options.expires_days)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(out_of_range)?
            .format("%a, %d %b %Y %H:%M:%S GMT");
        let signed = self.sign(value, now.timestamp());
        let cookie = format!(
            "{name}={signed}; Expires={expires}; Path={}",
            options.path
        );
        match HeaderValue::from_str(&cookie) {
            Ok(header) => {
                ctx.response_headers_mut().append(SET_COOKIE, header);
            }
            Err(_) => tracing::warn!(cookie = name, "cookie name or path is not a valid header value"),
        }
        Ok(())
    }

    /// Reads and verifies a cookie, accepting it for the default
    /// [`DEFAULT_EXPIRY_DAYS`](Self::DEFAULT_EXPIRY_DAYS).
    pub fn get(&self, ctx: &RequestContext, name: &str) -> Result<Option<Vec<u8>>, CookieError> {
        self.get_at(ctx, name, Self::DEFAULT_EXPIRY_DAYS, Utc::now())
    }

    /// Reads and verifies a cookie at the instant `now`.
    ///
    /// Returns `Ok(None)` when the cookie is absent or not in the signed
    /// format. An `expiry_days` too large to subtract from `now` fails with
    /// [`CookieError::ExpiryOutOfRange`].
    pub fn get_at(
        &self,
        ctx: &RequestContext,
        name: &str,
        expiry_days: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Vec<u8>>, CookieError> {
        let Some(raw) = request_cookie(ctx, name) else {
            return Ok(None);
        };
        let parts: Vec<&str> = raw.split('|').collect();
        let [encoded, timestamp, signature] = parts[..] else {
            return Ok(None);
        };

        let invalid = || CookieError::InvalidSignature {
            name: name.to_string(),
            signature: signature.to_string(),
        };
        let expected = decode_hex(signature).ok_or_else(invalid)?;
        if !self.verifies(encoded, timestamp, &expected) {
            return Err(invalid());
        }

        let Ok(issued) = timestamp.parse::<i64>() else {
            return Ok(None);
        };
        let oldest = expiry_days
            .checked_mul(SECONDS_PER_DAY)
            .and_then(|max_age| now.timestamp().checked_sub(max_age))
            .ok_or(CookieError::ExpiryOutOfRange { days: expiry_days })?;
        if issued < oldest {
            return Err(CookieError::Expired {
                name: name.to_string(),
            });
        }
        STANDARD.decode(encoded).map(Some).map_err(|_| invalid())
    }

    /// Produces the signed cookie value for `value` issued at `timestamp`.
    #[must_use]
    pub fn sign(&self, value: &[u8], timestamp: i64) -> String {
        let encoded = STANDARD.encode(value);
        let timestamp = timestamp.to_string();
        let signature = match self.keys.first() {
            Some(key) => encode_hex(&keyed(key, &encoded, &timestamp).finalize().into_bytes()),
            None => String::new(),
        };
        format!("{encoded}|{timestamp}|{signature}")
    }

    fn verifies(&self, encoded: &str, timestamp: &str, expected: &[u8]) -> bool {
        self.keys
            .iter()
            .any(|key| keyed(key, encoded, timestamp).verify_slice(expected).is_ok())
    }
}

impl fmt::Debug for SecureCookies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureCookies")
            .field("secrets", &self.keys.len())
            .finish()
    }
}

fn keyed(key: &HmacSha1, encoded: &str, timestamp: &str) -> HmacSha1 {
    let mut mac = key.clone();
    mac.update(encoded.as_bytes());
    mac.update(timestamp.as_bytes());
    mac
}

fn request_cookie<'a>(ctx: &'a RequestContext, name: &str) -> Option<&'a str> {
    ctx.headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

fn encode_hex(bytes: &[u8]) -> String {
    use fmt::Write as _;

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ISSUED: i64 = 1_700_000_000;

    fn at(ts: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(ts, 0).unwrap()
    }

    fn with_cookie(header: &str) -> RequestContext {
        RequestContext::builder().header("Cookie", header).build()
    }

    #[test]
    fn test_requires_a_secret() {
        assert_eq!(
            SecureCookies::new(Vec::<&str>::new()).unwrap_err(),
            CookieError::NoSecrets
        );
    }

    #[test]
    fn test_sign_format() {
        let cookies = SecureCookies::new(["s3cret"]).unwrap();
        let signed = cookies.sign(b"user-42", ISSUED);
        let parts: Vec<&str> = signed.split('|').collect();
        assert_eq!(parts[0], "dXNlci00Mg==");
        assert_eq!(parts[1], "1700000000");
        assert_eq!(parts[2].len(), 40);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_verifies_with_rotated_secret() {
        let old = SecureCookies::new(["old"]).unwrap();
        let signed = old.sign(b"user-42", ISSUED);

        let rotated = SecureCookies::new(["new", "old"]).unwrap();
        let ctx = with_cookie(&format!("theme=dark; sid={signed}"));
        let value = rotated.get_at(&ctx, "sid", 31, at(ISSUED + 60)).unwrap();
        assert_eq!(value.as_deref(), Some(&b"user-42"[..]));
    }

    #[test]
    fn test_expired() {
        let cookies = SecureCookies::new(["s3cret"]).unwrap();
        let ctx = with_cookie(&format!("sid={}", cookies.sign(b"v", ISSUED)));
        let err = cookies
            .get_at(&ctx, "sid", 31, at(ISSUED + 32 * SECONDS_PER_DAY))
            .unwrap_err();
        assert_eq!(err, CookieError::Expired { name: "sid".into() });
    }

    #[test]
    fn test_tampered_signature() {
        let cookies = SecureCookies::new(["s3cret"]).unwrap();
        let forged = SecureCookies::new(["guess"]).unwrap().sign(b"admin", ISSUED);
        let ctx = with_cookie(&format!("sid={forged}"));
        let err = cookies.get_at(&ctx, "sid", 31, at(ISSUED)).unwrap_err();
        assert!(matches!(err, CookieError::InvalidSignature { ref name, .. } if name == "sid"));
    }

    #[test]
    fn test_absent_or_malformed_is_none() {
        let cookies = SecureCookies::new(["s3cret"]).unwrap();
        let ctx = RequestContext::builder().build();
        assert_eq!(cookies.get(&ctx, "sid").unwrap(), None);

        let ctx = with_cookie("sid=only|two");
        assert_eq!(cookies.get(&ctx, "sid").unwrap(), None);
    }

    #[test]
    fn test_set_appends_header() {
        let cookies = SecureCookies::new(["s3cret"]).unwrap();
        let mut ctx = RequestContext::builder().build();
        cookies.set(&mut ctx, "sid", b"user-42").unwrap();
        cookies
            .set_with(
            &mut ctx,
            "pref",
            b"x",
            &CookieOptions {
                expires_days: 1,
                path: "/api".into(),
            },
        )
        .unwrap();

        let headers: Vec<&str> = ctx
            .response_headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(headers.len(), 2);
        assert!(headers[0].starts_with("sid=dXNlci00Mg==|"));
        assert!(headers[0].ends_with(" GMT; Path=/"));
        assert!(headers[1].ends_with("; Path=/api"));
    }

    #[test]
    fn test_roundtrip_through_header() {
        let cookies = SecureCookies::new(["s3cret"]).unwrap();
        let mut response = RequestContext::builder().build();
        cookies.set(&mut response, "sid", b"user-42").unwrap();

        let set = response.response_headers()[SET_COOKIE].to_str().unwrap();
        let pair = set.split(';').next().unwrap();
        let request = with_cookie(pair);
        assert_eq!(
            cookies.get(&request, "sid").unwrap().as_deref(),
            Some(&b"user-42"[..])
        );
    }

    #[test]
    fn test_extreme_expires_days_is_an_error() {
        let cookies = SecureCookies::new(["s3cret"]).unwrap();
        let mut ctx = RequestContext::builder().build();
        for days in [i64::MAX, i64::MIN, 400_000_000] {
            let options = CookieOptions {
                expires_days: days,
                path: "/".into(),
            };
            assert_eq!(
                cookies.set_at(&mut ctx, "sid", b"v", &options, at(ISSUED)),
                Err(CookieError::ExpiryOutOfRange { days })
            );
        }
        assert!(ctx.response_headers().get(SET_COOKIE).is_none());
    }

    #[test]
    fn test_expires_date_format() {
        let cookies = SecureCookies::new(["s3cret"]).unwrap();
        let mut ctx = RequestContext::builder().build();
        let options = CookieOptions {
            expires_days: 1,
            path: "/".into(),
        };
        cookies.set_at(&mut ctx, "sid", b"v", &options, at(ISSUED)).unwrap();
        let header = ctx.response_headers()[SET_COOKIE].to_str().unwrap();
        assert!(header.contains("; Expires=Wed, 15 Nov 2023 22:13:20 GMT; "));
    }

    #[test]
    fn test_extreme_expiry_days_is_an_error() {
        let cookies = SecureCookies::new(["s3cret"]).unwrap();
        let ctx = with_cookie(&format!("sid={}", cookies.sign(b"v", ISSUED)));
        assert_eq!(
            cookies.get_at(&ctx, "sid", i64::MAX, at(ISSUED)),
            Err(CookieError::ExpiryOutOfRange { days: i64::MAX })
        );
        assert_eq!(
            cookies.get_at(&ctx, "sid", i64::MIN / 2, at(ISSUED)),
            Err(CookieError::ExpiryOutOfRange { days: i64::MIN / 2 })
        );
    }

    #[test]
    fn test_hex() {
        assert_eq!(encode_hex(&[0x00, 0xab, 0xff]), "00abff");
        assert_eq!(decode_hex("00abff"), Some(vec![0x00, 0xab, 0xff]));
        assert_eq!(decode_hex("abc"), None);
        assert_eq!(decode_hex("zz"), None);
    }
}
