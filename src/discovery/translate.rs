//! Translation of registry instances into scrape addresses

use crate::registry::{InstanceSummary, ATTR_INSTANCE_IPV4, ATTR_INSTANCE_IPV6, ATTR_INSTANCE_PORT};

/// Scrape address of `instance`, or `None` if it has no IP address.
///
/// IPv4 is preferred over IPv6. When a port attribute is present the
/// result is `host:port`, with IPv6 hosts in brackets.
pub fn instance_address(instance: &InstanceSummary) -> Option<String> {
    let ip = instance
        .attribute(ATTR_INSTANCE_IPV4)
        .or_else(|| instance.attribute(ATTR_INSTANCE_IPV6))?;

    Some(match instance.attribute(ATTR_INSTANCE_PORT) {
        Some(port) => join_host_port(ip, port),
        None => ip.to_string(),
    })
}

/// Combine host and port, bracketing hosts that contain a colon
pub fn join_host_port(host: &str, port: &str) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
