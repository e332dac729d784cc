use crate::error::ReconError;
use std::net::IpAddr;

/// Parse a target that must be a literal IPv4 or IPv6 address
pub fn validate_ip_address(target: &str) -> Result<IpAddr, ReconError> {
    target.parse::<IpAddr>().map_err(|_| {
        ReconError::invalid_target(format!(
            "'{}' does not appear to be an IPv4 or IPv6 address",
            target
        ))
    })
}
