//! Proxy-access-key authentication: the single static credential every
//! inbound request (and every `/admin` operation) must present, either as
//! `x-api-key` or as `Authorization: Bearer`.

use http::HeaderMap;
use relaygate_core::ProxyError;

/// Reads the caller-supplied proxy key from `headers`, checking `x-api-key`
/// first and falling back to a `Bearer`/`bearer`-prefixed `Authorization`
/// header, mirroring the precedence the upstream-facing adapters use for
/// the reverse direction.
pub fn extract_proxy_key(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = header_str(headers, "x-api-key") {
        return Some(value.to_string());
    }
    let value = header_str(headers, "authorization")?;
    for prefix in ["Bearer ", "bearer "] {
        if let Some(stripped) = value.strip_prefix(prefix) {
            return Some(stripped.to_string());
        }
    }
    None
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name)?.to_str().ok()
}

/// Rejects the request unless the supplied key matches `expected` exactly.
pub fn check_proxy_key(headers: &HeaderMap, expected: &str) -> Result<(), ProxyError> {
    match extract_proxy_key(headers) {
        Some(key) if key == expected => Ok(()),
        _ => Err(ProxyError::Auth),
    }
}
