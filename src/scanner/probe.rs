//! TCP connect probing.
//!
//! A probe completes the full TCP handshake, so it needs no privileges. A
//! port that refuses, times out or is unreachable is reported as closed; only
//! an address that cannot possibly be dialed is an error.

use crate::error::ProbeError;
use crate::scanner::fingerprint::identify_service;
use crate::scanner::report::PortOutcome;
use crate::types::is_valid_hostname;
use async_trait::async_trait;
use std::net::{IpAddr, SocketAddr};
use std::sync::OnceLock;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// Read deadline for banner grabbing, independent of the connect timeout.
pub const BANNER_TIMEOUT: Duration = Duration::from_secs(2);

/// Maximum bytes peeked for a banner.
pub const MAX_BANNER_SIZE: usize = 512;

/// Probes a single `(address, port)` pair.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe one port. Connection failures yield `open = false`, not an error.
    async fn probe(&self, address: &str, port: u16) -> Result<PortOutcome, ProbeError>;
}

/// TCP connect prober with optional banner grabbing.
pub struct TcpProber {
    timeout: Duration,
    grab_banner: bool,
    resolver: OnceLock<TokioAsyncResolver>,
}

impl TcpProber {
    /// # Arguments
    /// * `timeout` - Budget for name resolution plus the TCP handshake
    /// * `grab_banner` - Whether to peek at the service banner on open ports
    pub fn new(timeout: Duration, grab_banner: bool) -> Self {
        Self {
            timeout,
            grab_banner,
            resolver: OnceLock::new(),
        }
    }

    fn resolver(&self) -> &TokioAsyncResolver {
        self.resolver.get_or_init(|| {
            TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|_| {
                TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
            })
        })
    }

    /// Resolve and connect within the configured timeout.
    async fn connect(&self, host: Host<'_>, port: u16) -> Option<TcpStream> {
        let attempt = async {
            let ip = match host {
                Host::Ip(ip) => ip,
                Host::Name(name) => match self.resolver().lookup_ip(name).await {
                    Ok(lookup) => lookup.iter().next()?,
                    Err(e) => {
                        debug!(host = name, error = %e, "name resolution failed");
                        return None;
                    }
                },
            };
            TcpStream::connect(SocketAddr::new(ip, port)).await.ok()
        };

        timeout(self.timeout, attempt).await.ok().flatten()
    }
}

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, address: &str, port: u16) -> Result<PortOutcome, ProbeError> {
        let host = Host::parse(address)?;

        let Some(stream) = self.connect(host, port).await else {
            return Ok(PortOutcome::closed(port));
        };

        let outcome = PortOutcome::open(port);
        if !self.grab_banner {
            return Ok(outcome);
        }

        let banner = peek_banner(&stream).await;
        drop(stream);

        let service = banner
            .as_deref()
            .and_then(identify_service)
            .map(str::to_string);

        Ok(outcome.with_banner(banner).with_service(service))
    }
}

/// An address in dialable form.
#[derive(Debug, Clone, Copy)]
enum Host<'a> {
    Ip(IpAddr),
    Name(&'a str),
}

impl<'a> Host<'a> {
    fn parse(address: &'a str) -> Result<Self, ProbeError> {
        if let Ok(ip) = address.parse::<IpAddr>() {
            Ok(Self::Ip(ip))
        } else if is_valid_hostname(address) {
            Ok(Self::Name(address))
        } else {
            Err(ProbeError::InvalidAddress(address.to_string()))
        }
    }
}

/// Peek at whatever the service sent on connect, without consuming it.
///
/// Errors and timeouts give `None`; so does a banner that is blank after trimming.
async fn peek_banner(stream: &TcpStream) -> Option<String> {
    let mut buffer = [0u8; MAX_BANNER_SIZE];

    match timeout(BANNER_TIMEOUT, stream.peek(&mut buffer)).await {
        Ok(Ok(n)) if n > 0 => {
            let text = String::from_utf8_lossy(&buffer[..n]).trim().to_string();
            (!text.is_empty()).then_some(text)
        }
        _ => None,
    }
}
