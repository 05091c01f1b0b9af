//! Per-site request and response conventions.

use std::net::IpAddr;

use http::header::SERVER;
use http::HeaderValue;
use strata_core::{RequestContext, ResponseHead};

use crate::{Result, ServerError};

/// `Server` header sent when no identity is configured.
pub const DEFAULT_SERVER_IDENT: &str = "Strata";

/// Header a fronting proxy uses to pass the caller's address.
pub const X_REAL_IP: &str = "x-real-ip";

/// How the site identifies itself and where client addresses come from.
#[derive(Debug, Clone)]
pub struct Site {
    server_ident: HeaderValue,
    honor_x_real_ip: bool,
}

impl Default for Site {
    fn default() -> Self {
        Self {
            server_ident: HeaderValue::from_static(DEFAULT_SERVER_IDENT),
            honor_x_real_ip: true,
        }
    }
}

impl Site {
    /// Creates a site. `server_ident` is usually `name/version`.
    pub fn new(server_ident: Option<&str>, honor_x_real_ip: bool) -> Result<Self> {
        let server_ident = match server_ident {
            Some(ident) => HeaderValue::from_str(ident)
                .map_err(|_| ServerError::InvalidServerIdent(ident.to_string()))?,
            None => HeaderValue::from_static(DEFAULT_SERVER_IDENT),
        };
        Ok(Self {
            server_ident,
            honor_x_real_ip,
        })
    }

    /// Returns the `Server` header value.
    #[must_use]
    pub fn server_ident(&self) -> &HeaderValue {
        &self.server_ident
    }

    /// Records the client address on `ctx`.
    ///
    /// A parseable `X-Real-IP` header wins over the socket peer when the
    /// site honors it.
    pub fn set_client_ip(&self, ctx: &mut RequestContext, peer: Option<IpAddr>) {
        let forwarded = if self.honor_x_real_ip {
            ctx.header(X_REAL_IP).and_then(|v| v.trim().parse().ok())
        } else {
            None
        };
        ctx.set_client_ip(forwarded.or(peer));
    }

    /// Stamps the `Server` header on an outgoing response.
    pub fn stamp(&self, head: &mut ResponseHead) {
        head.headers.insert(SERVER, self.server_ident.clone());
    }
}
