// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request provenance (client address and user agent) for audit records.

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

/// Client address resolved by an upstream layer (e.g. a trusted proxy hop).
/// Takes precedence over every header.
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub IpAddr);

/// Best-effort provenance of the request that triggered an audited action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    /// Explicit client IP (`ClientIp` extension or `x-real-ip`)
    pub client_ip: Option<String>,
    /// First hop of `x-forwarded-for`
    pub forwarded_for: Option<String>,
    /// Socket peer address
    pub remote_addr: Option<SocketAddr>,
    pub user_agent: Option<String>,
}

impl RequestMeta {
    pub fn from_parts(parts: &Parts) -> Self {
        let client_ip = parts
            .extensions
            .get::<ClientIp>()
            .map(|ip| ip.0.to_string())
            .or_else(|| header_str(&parts.headers, "x-real-ip"));

        let forwarded_for = header_str(&parts.headers, "x-forwarded-for").and_then(|value| {
            value
                .split(',')
                .next()
                .map(str::trim)
                .filter(|first| !first.is_empty())
                .map(str::to_string)
        });

        let remote_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0);

        Self {
            client_ip,
            forwarded_for,
            remote_addr,
            user_agent: header_str(&parts.headers, header::USER_AGENT.as_str()),
        }
    }

    /// Client IP: explicit field, then `x-forwarded-for`, then the socket peer.
    pub fn ip_address(&self) -> Option<String> {
        self.client_ip
            .clone()
            .or_else(|| self.forwarded_for.clone())
            .or_else(|| self.remote_addr.map(|addr| addr.ip().to_string()))
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl<S> FromRequestParts<S> for RequestMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_explicit_ip_wins() {
        let mut p = parts(
            Request::builder()
                .header("x-real-ip", "10.0.0.1")
                .header("x-forwarded-for", "203.0.113.9, 10.0.0.2"),
        );
        p.extensions
            .insert(ConnectInfo("127.0.0.1:5000".parse::<SocketAddr>().unwrap()));

        let meta = RequestMeta::from_parts(&p);
        assert_eq!(meta.ip_address().as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn test_forwarded_for_first_hop() {
        let p = parts(Request::builder().header("x-forwarded-for", "203.0.113.9, 10.0.0.2"));
        let meta = RequestMeta::from_parts(&p);
        assert_eq!(meta.ip_address().as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn test_falls_back_to_socket_address() {
        let mut p = parts(Request::builder().header("user-agent", "curl/8.0"));
        p.extensions
            .insert(ConnectInfo("192.0.2.4:443".parse::<SocketAddr>().unwrap()));

        let meta = RequestMeta::from_parts(&p);
        assert_eq!(meta.ip_address().as_deref(), Some("192.0.2.4"));
        assert_eq!(meta.user_agent.as_deref(), Some("curl/8.0"));
    }

    #[test]
    fn test_absent_when_nothing_known() {
        let meta = RequestMeta::from_parts(&parts(Request::builder()));
        assert_eq!(meta.ip_address(), None);
        assert_eq!(meta.user_agent, None);
    }
}
