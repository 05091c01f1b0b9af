//! `Content-Type` checking shared by the body and query validators.

use strata_core::{ApiError, RequestContext};

/// The media type expected by default for JSON bodies.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Checks that the request declares `<media_type>; charset=utf-8`.
///
/// Whitespace is ignored and the comparison is case-insensitive. A missing
/// header or a different media type is a `ContentTypeError`; a missing
/// charset, extra parameters or a charset other than UTF-8 is a
/// `CharsetNotUTF8Error`.
pub fn check_content_type(ctx: &RequestContext, media_type: &str) -> Result<(), ApiError> {
    let Some(raw) = ctx.content_type() else {
        return Err(ApiError::content_type());
    };

    let normalized: String = raw.to_lowercase().chars().filter(|c| *c != ' ').collect();
    let mut parts = normalized.split(';');
    let (Some(sent_type), Some(sent_charset), None) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(ApiError::charset_not_utf8());
    };

    if sent_charset != "charset=utf-8" {
        return Err(ApiError::charset_not_utf8());
    }
    if sent_type != media_type {
        return Err(ApiError::content_type());
    }
    Ok(())
}
