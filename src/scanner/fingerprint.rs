//! Banner fingerprinting.
//!
//! Identification is a case-insensitive substring search for known product
//! markers. Markers are tried in declaration order and the first hit wins,
//! so a banner naming several products always maps to the same service.

/// Known banner markers and the service each one identifies.
pub const FINGERPRINTS: &[(&str, &str)] = &[
    ("OpenSSH", "SSH server"),
    ("Apache", "Apache HTTP Server"),
    ("nginx", "nginx HTTP Server"),
    ("MySQL", "MySQL service"),
    ("PostgreSQL", "PostgreSQL service"),
];

/// Identify the service behind a banner.
pub fn identify_service(banner: &str) -> Option<&'static str> {
    if banner.is_empty() {
        return None;
    }

    let banner = banner.to_lowercase();
    FINGERPRINTS
        .iter()
        .find(|(marker, _)| banner.contains(&marker.to_lowercase()))
        .map(|&(_, service)| service)
}
