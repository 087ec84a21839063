//! Originating client address resolution.
//!
//! # Responsibilities
//! - Walk an ordered list of trusted headers, first non-empty value wins
//! - Strip ports where a vendor embeds them
//! - Take the leftmost hop of a forwarded chain
//! - Fall back to the transport peer endpoint
//!
//! # Design Decisions
//! - Values are returned as-is; callers validate with `ip::classify`
//! - Every header except the peer endpoint is client-forgeable unless the
//!   edge in front strips it, so the header list is configurable

use std::collections::HashMap;

use axum::http::HeaderMap;

/// Read-only, case-insensitive header lookup.
pub trait HeaderSource {
    /// Returns the value of `name`, or `None` when absent or not representable as text.
    fn header(&self, name: &str) -> Option<&str>;
}

impl HeaderSource for HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.to_str().ok())
    }
}

impl HeaderSource for HashMap<String, String> {
    fn header(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// How a header value carries the client address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderFormat {
    /// The whole value is the address.
    Plain,
    /// `host:port`; the port is dropped when present.
    HostPort,
    /// Comma separated hop list; the first entry is the client.
    Chain,
}

/// A header the resolver is allowed to trust.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedHeader {
    pub name: String,
    pub format: HeaderFormat,
}

impl TrustedHeader {
    pub fn new(name: impl Into<String>, format: HeaderFormat) -> Self {
        Self {
            name: name.into(),
            format,
        }
    }

    /// Build a header entry from a bare name, picking the known format for it.
    pub fn from_name(name: &str) -> Self {
        let format = DEFAULT_TRUSTED_HEADERS
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(_, format)| *format)
            .unwrap_or(HeaderFormat::Plain);
        Self::new(name, format)
    }

    fn extract<'a>(&self, value: &'a str) -> &'a str {
        match self.format {
            HeaderFormat::Plain => value,
            HeaderFormat::HostPort => split_host_port(value).unwrap_or(value),
            HeaderFormat::Chain => value.split(',').next().unwrap_or(value).trim(),
        }
    }
}

/// Default header precedence, highest first.
pub const DEFAULT_TRUSTED_HEADERS: &[(&str, HeaderFormat)] = &[
    // Cloudflare
    ("CF-Connecting-IP", HeaderFormat::Plain),
    // Tencent Cloud EdgeOne
    ("EO-Client-IP", HeaderFormat::Plain),
    // Alibaba Cloud CDN
    ("Ali-CDN-Real-IP", HeaderFormat::Plain),
    // Huawei Cloud CDN
    ("X-HW-Real-IP", HeaderFormat::Plain),
    // Baidu Cloud CDN
    ("Baidu-Real-IP", HeaderFormat::Plain),
    // Qiniu CDN
    ("X-Qiniu-CDN-Real-IP", HeaderFormat::Plain),
    // Wangsu CDN
    ("Cdn-Real-Ip", HeaderFormat::Plain),
    // Fastly
    ("Fastly-Client-IP", HeaderFormat::Plain),
    // AWS CloudFront sends "ip:port"
    ("CloudFront-Viewer-Address", HeaderFormat::HostPort),
    // Azure Front Door
    ("X-Azure-ClientIP", HeaderFormat::Plain),
    // Generic trusted proxy (nginx and friends)
    ("X-Real-IP", HeaderFormat::Plain),
    ("X-Forwarded-For", HeaderFormat::Chain),
];

/// Resolves the best-guess originating address of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressResolver {
    headers: Vec<TrustedHeader>,
}

impl AddressResolver {
    /// Create a resolver that consults `headers` in order.
    pub fn new(headers: Vec<TrustedHeader>) -> Self {
        Self { headers }
    }

    /// Create a resolver from header names, in precedence order.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(
            names
                .into_iter()
                .map(|n| TrustedHeader::from_name(n.as_ref()))
                .collect(),
        )
    }

    /// A resolver that ignores headers and only uses the peer endpoint.
    pub fn peer_only() -> Self {
        Self::new(Vec::new())
    }

    /// Headers consulted, highest precedence first.
    pub fn headers(&self) -> &[TrustedHeader] {
        &self.headers
    }

    /// Resolve the client address.
    ///
    /// Never fails. The result may be empty or malformed when the inputs are.
    pub fn resolve<H>(&self, headers: &H, fallback: &str) -> String
    where
        H: HeaderSource + ?Sized,
    {
        for trusted in &self.headers {
            match headers.header(&trusted.name) {
                Some(value) if !value.is_empty() => return trusted.extract(value).to_string(),
                _ => continue,
            }
        }

        split_host_port(fallback).unwrap_or(fallback).to_string()
    }
}

impl Default for AddressResolver {
    fn default() -> Self {
        Self::new(
            DEFAULT_TRUSTED_HEADERS
                .iter()
                .map(|(name, format)| TrustedHeader::new(*name, *format))
                .collect(),
        )
    }
}

/// Split `host:port` and return the host.
///
/// Accepts `host:port` and `[v6]:port`. Returns `None` when there is no port
/// separator, when the host has more than one colon outside brackets, or when
/// a stray `[` or `]` follows the host.
pub fn split_host_port(addr: &str) -> Option<&str> {
    let colon = addr.rfind(':')?;

    let (host, host_start, host_end) = if let Some(rest) = addr.strip_prefix('[') {
        let end = rest.find(']')? + 1;
        // The closing bracket must be followed directly by the last colon.
        if end + 1 != colon {
            return None;
        }
        (&addr[1..end], 1, end + 1)
    } else {
        let host = &addr[..colon];
        if host.contains(':') {
            return None;
        }
        (host, 0, 0)
    };

    if addr[host_start..].contains('[') || addr[host_end..].contains(']') {
        return None;
    }
    Some(host)
}
