//! JSON output helpers.
//!
//! Bodies are written with `", "` and `": "` separators so that every
//! response, error envelopes included, has the same byte layout clients
//! already parse.

use std::io;

use bytes::Bytes;
use http::header::CONTENT_LENGTH;
use http::HeaderValue;
use serde::Serialize;
use serde_json::ser::Formatter;

use crate::{ApiError, RequestContext};

/// Formatter emitting spaced separators on a single line.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Serializes `value` to a byte vector.
pub fn to_vec<T>(value: &T) -> serde_json::Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    let mut out = Vec::with_capacity(128);
    let mut ser = serde_json::Serializer::with_formatter(&mut out, SpacedFormatter);
    value.serialize(&mut ser)?;
    Ok(out)
}

/// Serializes `value` to a string.
pub fn to_string<T>(value: &T) -> serde_json::Result<String>
where
    T: ?Sized + Serialize,
{
    let bytes = to_vec(value)?;
    // serde_json only emits valid UTF-8.
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Serializes `value` as the response body and sets `Content-Length`.
///
/// Non-ASCII text is written verbatim. If serialization fails the request
/// is failed with a `JSONEncodeError` envelope instead.
pub fn write_json<T>(ctx: &mut RequestContext, value: &T) -> Bytes
where
    T: ?Sized + Serialize,
{
    let body = match to_vec(value) {
        Ok(body) => Bytes::from(body),
        Err(e) => {
            tracing::error!(error = %e, "failed to JSON-encode call result");
            ctx.reject(&ApiError::json_encode())
        }
    };
    ctx.response_headers_mut()
        .insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
    body
}
