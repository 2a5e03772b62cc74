use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;

use crate::AppState;

/// 请求来源地址，用于节流键
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl FromRequestParts<AppState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip());
        Ok(ClientIp(resolve_client_ip(
            &parts.headers,
            peer,
            &state.config.trusted_proxies,
        )))
    }
}

/// 解析客户端地址
///
/// 只有直接连接的对端是受信任代理时才读取代理头，
/// `X-Forwarded-For` 从右往左取第一个非代理地址，无法解析的条目跳过。
/// IPv4 映射的 IPv6 地址按 IPv4 比较。
pub fn resolve_client_ip(headers: &HeaderMap, peer: Option<IpAddr>, trusted: &[IpAddr]) -> String {
    let Some(peer) = peer.map(|ip| ip.to_canonical()) else {
        return "unknown".to_string();
    };
    if !trusted.contains(&peer) {
        return peer.to_string();
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
        .map(|ip| ip.to_canonical());
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|h| h.to_str().ok()) {
        for hop in forwarded.rsplit(',').map(str::trim).filter(|s| !s.is_empty()) {
            match hop.parse::<IpAddr>().map(|ip| ip.to_canonical()) {
                Ok(ip) if trusted.contains(&ip) => continue,
                Ok(ip) => return ip.to_string(),
                Err(_) => tracing::debug!("Skipping malformed forwarded hop: {}", hop),
            }
        }
    }

    peer.to_string()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn forwarded(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn untrusted_peer_cannot_spoof_headers() {
        let headers = forwarded("1.1.1.1");
        let resolved = resolve_client_ip(&headers, Some(ip("203.0.113.9")), &[ip("10.0.0.1")]);
        assert_eq!(resolved, "203.0.113.9");
    }

    #[test]
    fn trusted_proxy_forwards_rightmost_client() {
        let trusted = [ip("10.0.0.1"), ip("10.0.0.2")];
        // 最左边的地址由客户端自己填写，不可信
        let headers = forwarded("6.6.6.6, 198.51.100.4, 10.0.0.2");
        let resolved = resolve_client_ip(&headers, Some(ip("10.0.0.1")), &trusted);
        assert_eq!(resolved, "198.51.100.4");
    }

    #[test]
    fn trusted_proxy_real_ip_header_wins() {
        let mut headers = forwarded("6.6.6.6");
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.7"));
        let resolved = resolve_client_ip(&headers, Some(ip("10.0.0.1")), &[ip("10.0.0.1")]);
        assert_eq!(resolved, "198.51.100.7");
    }

    #[test]
    fn malformed_hop_is_skipped() {
        let trusted = [ip("10.0.0.1")];
        let headers = forwarded("198.51.100.4, bogus");
        let resolved = resolve_client_ip(&headers, Some(ip("10.0.0.1")), &trusted);
        assert_eq!(resolved, "198.51.100.4");
    }

    #[test]
    fn mapped_ipv6_peer_matches_trusted_ipv4() {
        let trusted = [ip("10.0.0.1")];
        let headers = forwarded("198.51.100.4");
        let resolved = resolve_client_ip(&headers, Some(ip("::ffff:10.0.0.1")), &trusted);
        assert_eq!(resolved, "198.51.100.4");

        let resolved = resolve_client_ip(&HeaderMap::new(), Some(ip("::ffff:203.0.113.9")), &trusted);
        assert_eq!(resolved, "203.0.113.9");
    }

    #[test]
    fn garbage_or_missing_headers_fall_back_to_peer() {
        let trusted = [ip("10.0.0.1")];
        let resolved = resolve_client_ip(&forwarded("bogus"), Some(ip("10.0.0.1")), &trusted);
        assert_eq!(resolved, "10.0.0.1");
        let resolved = resolve_client_ip(&HeaderMap::new(), None, &trusted);
        assert_eq!(resolved, "unknown");
    }
}
