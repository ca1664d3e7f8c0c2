//! Target expansion.
//!
//! A target is either a single address (kept verbatim, checked only when it is
//! dialed) or a CIDR block that expands to its host addresses.

use ipnetwork::IpNetwork;
use std::fmt;
use std::str::FromStr;

/// Error type for target parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("invalid CIDR notation: '{0}'")]
    InvalidCidr(String),
    #[error("CIDR block too large: {0} addresses (max: {1})")]
    CidrTooLarge(String, u128),
}

/// A parsed scan target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// A single address or hostname, exactly as written.
    Single(String),
    /// A CIDR block.
    Cidr(IpNetwork),
}

impl TargetSpec {
    /// Maximum number of addresses a CIDR block may cover (a /16 for IPv4).
    pub const MAX_CIDR_HOSTS: u128 = 65536;

    /// Parse a target. Anything containing `/` is treated as a CIDR block.
    ///
    /// Both forms are taken exactly as written; surrounding whitespace makes
    /// a CIDR block malformed.
    pub fn parse(s: &str) -> Result<Self, TargetError> {
        if !s.contains('/') {
            return Ok(Self::Single(s.to_string()));
        }

        let network: IpNetwork = s
            .parse()
            .map_err(|_| TargetError::InvalidCidr(s.to_string()))?;

        match block_size(&network) {
            Some(size) if size <= Self::MAX_CIDR_HOSTS => Ok(Self::Cidr(network)),
            Some(size) => Err(TargetError::CidrTooLarge(
                size.to_string(),
                Self::MAX_CIDR_HOSTS,
            )),
            // 2^128 does not fit in a u128
            None => Err(TargetError::CidrTooLarge(
                "2^128".to_string(),
                Self::MAX_CIDR_HOSTS,
            )),
        }
    }

    /// Expand into concrete host addresses in ascending numeric order.
    ///
    /// Blocks of more than two addresses lose their first (network) and last
    /// (broadcast) address. /31 and /32 style blocks are returned whole.
    pub fn expand(&self) -> Vec<String> {
        match self {
            Self::Single(address) => vec![address.clone()],
            Self::Cidr(network) => {
                let mut hosts: Vec<String> = network.iter().map(|ip| ip.to_string()).collect();
                if hosts.len() > 2 {
                    hosts.pop();
                    hosts.remove(0);
                }
                hosts
            }
        }
    }

    /// Number of addresses `expand` will return.
    pub fn host_count(&self) -> u128 {
        match self {
            Self::Single(_) => 1,
            Self::Cidr(network) => match block_size(network) {
                Some(size) if size > 2 => size - 2,
                Some(size) => size,
                None => u128::MAX,
            },
        }
    }
}

impl FromStr for TargetSpec {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(address) => write!(f, "{}", address),
            Self::Cidr(network) => write!(f, "{}", network),
        }
    }
}

/// Parse and expand a target string in one step.
pub fn expand_target(target: &str) -> Result<Vec<String>, TargetError> {
    Ok(TargetSpec::parse(target)?.expand())
}

/// Total addresses in a block, `None` when it overflows a u128.
fn block_size(network: &IpNetwork) -> Option<u128> {
    let host_bits = match network {
        IpNetwork::V4(net) => 32 - u32::from(net.prefix()),
        IpNetwork::V6(net) => 128 - u32::from(net.prefix()),
    };
    1u128.checked_shl(host_bits)
}

/// Check if a string is a syntactically valid hostname.
pub(crate) fn is_valid_hostname(s: &str) -> bool {
    if s.is_empty() || s.len() > 253 {
        return false;
    }

    // Each label must be 1-63 characters
    for label in s.split('.') {
        if label.is_empty() || label.len() > 63 {
            return false;
        }
        // Must start and end with alphanumeric
        if !label.chars().next().is_some_and(|c| c.is_ascii_alphanumeric()) {
            return false;
        }
        if !label.chars().last().is_some_and(|c| c.is_ascii_alphanumeric()) {
            return false;
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return false;
        }
    }

    true
}
