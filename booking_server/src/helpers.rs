use std::{net::IpAddr, str::FromStr};

use actix_web::{dev::ServiceRequest, HttpRequest};
use log::{debug, trace};
use regex::Regex;

/// Get the remote IP address from the request. It uses 3 sources to determine the IP address, in decreasing order
/// of preference:
/// 1. The `X-Forwarded-For` header, iif `use_x_forwarded_for` is set to true in the configuration.
/// 2. The `Forwarded` header, iif `use_forwarded` is set to true in the configuration.
/// 3. The peer address from the connection info.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    let x_forwarded_for = req.headers().get("X-Forwarded-For").and_then(|v| v.to_str().ok());
    let forwarded = req.headers().get("Forwarded").and_then(|v| v.to_str().ok());
    let peer_addr = req.connection_info().peer_addr().map(|a| a.to_string());
    resolve_remote_ip(
        x_forwarded_for.filter(|_| use_x_forwarded_for),
        forwarded.filter(|_| use_forwarded),
        peer_addr.as_deref(),
    )
}

/// [`get_remote_ip`] for middleware, which sees the request before it has been turned into an `HttpRequest`.
pub fn get_service_request_ip(req: &ServiceRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    get_remote_ip(req.request(), use_x_forwarded_for, use_forwarded)
}

/// `None` means no whitelist is configured, and every peer is allowed. A peer whose address cannot be determined is
/// never allowed through a whitelist.
pub fn is_whitelisted(peer: Option<IpAddr>, whitelist: Option<&[IpAddr]>) -> bool {
    match (peer, whitelist) {
        (_, None) => true,
        (Some(ip), Some(whitelist)) => whitelist.contains(&ip),
        (None, Some(_)) => false,
    }
}

fn resolve_remote_ip(x_forwarded_for: Option<&str>, forwarded: Option<&str>, peer: Option<&str>) -> Option<IpAddr> {
    let mut result = None;
    if let Some(header) = x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        // The left-most entry is the original client
        result = header.split(',').next().map(str::trim).and_then(|s| IpAddr::from_str(s).ok());
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if result.is_none() {
        if let Some(header) = forwarded {
            trace!("Checking Forwarded header");
            result = Regex::new(r#"for="?\[?(?P<ip>[0-9a-fA-F.:]+?)\]?(:\d+)?"?(;|,|$)"#)
                .ok()
                .and_then(|re| re.captures(header).and_then(|caps| caps.name("ip")).map(|m| m.as_str().to_string()))
                .and_then(|s| IpAddr::from_str(&s).ok());
            if let Some(ip) = result {
                debug!("Using Forwarded header for remote address: {ip}");
            }
        }
    }
    result.or_else(|| {
        trace!("Using Peer address for remote address: {:?}", peer);
        peer.and_then(|s| IpAddr::from_str(s).ok())
    })
}
