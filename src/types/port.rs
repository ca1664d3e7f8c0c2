//! Port specification parsing.
//!
//! A port specification is a comma-separated list of single ports and
//! inclusive `low-high` ranges, e.g. `"22,80,8000-8010"`. Parsing never
//! enforces an upper bound; callers that dial the ports check that.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Error type for port specification parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("invalid port number: '{0}'")]
    InvalidFormat(String),
    #[error("malformed port range: '{0}'")]
    InvalidRange(String),
}

/// An inclusive range of ports. Bounds written in reverse are swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    start: u32,
    end: u32,
}

impl PortRange {
    /// Create a range from two bounds given in either order.
    pub fn new(a: u32, b: u32) -> Self {
        if a > b {
            Self { start: b, end: a }
        } else {
            Self { start: a, end: b }
        }
    }

    /// Create a range containing a single port.
    pub const fn single(port: u32) -> Self {
        Self {
            start: port,
            end: port,
        }
    }

    pub const fn start(&self) -> u32 {
        self.start
    }

    pub const fn end(&self) -> u32 {
        self.end
    }

    /// Number of ports in this range.
    pub const fn len(&self) -> u64 {
        (self.end - self.start) as u64 + 1
    }

    /// A range always holds at least one port.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over all ports in this range.
    pub fn iter(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// A parsed port specification.
///
/// Supports formats like:
/// - Single port: "80"
/// - Comma-separated: "80,443,8080"
/// - Range: "1-1000" (or "1000-1")
/// - Mixed: "22,80,443,8000-9000"
///
/// Whitespace around tokens and range bounds is ignored and empty tokens are
/// skipped, so `" 22 , ,80 "` is the same as `"22,80"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    ranges: Vec<PortRange>,
}

impl PortSpec {
    /// Create an empty port specification.
    pub const fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Add a port range to the specification.
    pub fn add_range(&mut self, range: PortRange) {
        self.ranges.push(range);
    }

    /// Add a single port to the specification.
    pub fn add_port(&mut self, port: u32) {
        self.ranges.push(PortRange::single(port));
    }

    /// The ranges in the order they were written.
    pub fn ranges(&self) -> &[PortRange] {
        &self.ranges
    }

    /// All ports as a sorted, deduplicated vector.
    pub fn ports(&self) -> Vec<u32> {
        self.ranges
            .iter()
            .flat_map(|r| r.iter())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Largest port mentioned, without expanding the ranges.
    pub fn max_port(&self) -> Option<u32> {
        self.ranges.iter().map(|r| r.end).max()
    }

    /// Number of unique ports, computed from the ranges without expanding them.
    pub fn count(&self) -> u64 {
        let mut ranges: Vec<(u32, u32)> = self.ranges.iter().map(|r| (r.start, r.end)).collect();
        ranges.sort_unstable();

        let mut total = 0u64;
        let mut covered: Option<u32> = None;
        for (start, end) in ranges {
            let start = match covered {
                Some(last) if start <= last => match last.checked_add(1) {
                    Some(next) if next <= end => next,
                    _ => continue,
                },
                _ => start,
            };
            total += u64::from(end - start) + 1;
            covered = Some(end);
        }
        total
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl FromStr for PortSpec {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut spec = Self::new();

        for token in s.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }

            if token.contains('-') {
                let bounds: Vec<&str> = token.split('-').collect();
                if bounds.len() != 2 {
                    return Err(PortError::InvalidRange(token.to_string()));
                }
                let low = parse_number(bounds[0])?;
                let high = parse_number(bounds[1])?;
                spec.add_range(PortRange::new(low, high));
            } else {
                spec.add_port(parse_number(token)?);
            }
        }

        Ok(spec)
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.ranges.iter().map(|r| r.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

fn parse_number(s: &str) -> Result<u32, PortError> {
    let s = s.trim();
    s.parse().map_err(|_| PortError::InvalidFormat(s.to_string()))
}

/// Parse a port specification into a sorted list of distinct ports.
pub fn parse_ports(spec: &str) -> Result<Vec<u32>, PortError> {
    Ok(spec.parse::<PortSpec>()?.ports())
}

/// Join ports back into a specification string, e.g. `[22, 80]` -> `"22,80"`.
pub fn join_ports(ports: &[u32]) -> String {
    ports
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
