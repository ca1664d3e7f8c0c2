use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use trawl::scanner::{scan_host, scan_network, NetworkScanner, ScanRequest};
use trawl::{ScanCancel, ScanError};

/// Listener that greets every connection with `banner`.
async fn banner_server(banner: &'static [u8]) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = socket.write_all(banner).await;
                tokio::time::sleep(Duration::from_secs(1)).await;
            });
        }
    });
    port
}

/// A port with nothing listening on it.
async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

#[tokio::test]
async fn test_localhost_ssh_banner() {
    let ssh = banner_server(b"SSH-2.0-OpenSSH_9.6p1 Ubuntu-3\r\n").await;
    let closed = closed_port().await;

    let request = ScanRequest::new("127.0.0.1/32", format!("{},{}", closed, ssh))
        .with_timeout_ms(500)
        .with_banner(true);
    let report = scan_network(&request).await.unwrap();

    assert_eq!(report.target, "127.0.0.1/32");
    assert!(report.dead_hosts.is_empty());
    assert_eq!(report.alive_hosts.len(), 1);

    let host = &report.alive_hosts[0];
    assert_eq!(host.address(), "127.0.0.1");
    assert!(host.is_alive());
    assert_eq!(host.open_ports().len(), 1);

    let port = &host.open_ports()[0];
    assert_eq!(port.port, ssh);
    assert!(port.open);
    assert_eq!(port.banner.as_deref(), Some("SSH-2.0-OpenSSH_9.6p1 Ubuntu-3"));
    assert_eq!(port.service.as_deref(), Some("SSH server"));
}

#[tokio::test]
async fn test_result_independent_of_concurrency() {
    let web = banner_server(b"HTTP/1.1 200 OK\r\nServer: nginx/1.24.0\r\n\r\n").await;
    let db = banner_server(b"5.7.42 MySQL Community Server\0").await;
    let closed = closed_port().await;
    let ports = format!("{},{},{}", db, closed, web);

    let mut reports = Vec::new();
    for concurrency in [1, 50] {
        let request = ScanRequest::new("127.0.0.1", ports.clone())
            .with_concurrency(concurrency)
            .with_timeout_ms(500)
            .with_banner(true);
        reports.push(scan_network(&request).await.unwrap());
    }

    assert_eq!(reports[0].alive_hosts, reports[1].alive_hosts);
    assert_eq!(reports[0].dead_hosts, reports[1].dead_hosts);

    let open: Vec<u16> = reports[0].alive_hosts[0]
        .open_ports()
        .iter()
        .map(|p| p.port)
        .collect();
    let mut expected = vec![db, web];
    expected.sort_unstable();
    assert_eq!(open, expected);
}

#[tokio::test]
async fn test_every_address_is_partitioned() {
    let closed = closed_port().await;
    let request = ScanRequest::new("127.0.0.0/29", closed.to_string())
        .with_concurrency(3)
        .with_timeout_ms(300);
    let report = scan_network(&request).await.unwrap();

    assert_eq!(report.host_count(), 6);
    assert!(report.alive_hosts.is_empty());

    let addresses: Vec<&str> = report.dead_hosts.iter().map(|h| h.address()).collect();
    assert_eq!(
        addresses,
        vec!["127.0.0.1", "127.0.0.2", "127.0.0.3", "127.0.0.4", "127.0.0.5", "127.0.0.6"]
    );
    assert!(report.dead_hosts.iter().all(|h| !h.is_alive()));
}

#[tokio::test]
async fn test_closed_port_reported_within_timeout() {
    let closed = closed_port().await;

    let started = Instant::now();
    let outcome = scan_host("127.0.0.1", &[closed], Duration::from_millis(500), 4, false).await;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(!outcome.is_alive());
    assert!(outcome.open_ports().is_empty());
}

#[tokio::test]
async fn test_malformed_request_fails_fast() {
    let bad_ports = ScanRequest::new("127.0.0.1", "22,abc");
    assert!(matches!(
        scan_network(&bad_ports).await,
        Err(ScanError::InvalidPorts(_))
    ));

    let bad_target = ScanRequest::new("127.0.0.1/33", "22");
    assert!(matches!(
        scan_network(&bad_target).await,
        Err(ScanError::InvalidTarget(_))
    ));

    let too_high = ScanRequest::new("127.0.0.1", "65530-65536");
    assert!(matches!(
        scan_network(&too_high).await,
        Err(ScanError::PortOutOfRange(65536))
    ));
}

#[tokio::test]
async fn test_cancelled_scan_returns_error() {
    let cancel = ScanCancel::new();
    cancel.cancel();

    let scanner = NetworkScanner::new().with_cancel(cancel);
    let request = ScanRequest::new("127.0.0.0/28", "1-100").with_timeout_ms(200);
    assert!(matches!(
        scanner.scan(&request).await,
        Err(ScanError::Cancelled)
    ));
}

#[tokio::test]
async fn test_report_json_shape() {
    let ssh = banner_server(b"SSH-2.0-OpenSSH_8.9\r\n").await;
    let request = ScanRequest::new("127.0.0.1", ssh.to_string()).with_timeout_ms(500);
    let report = scan_network(&request).await.unwrap();

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["alive_hosts"][0]["alive"], true);
    assert_eq!(value["alive_hosts"][0]["open_ports"][0]["port"], ssh);
    assert_eq!(value["alive_hosts"][0]["open_ports"][0]["open"], true);
    assert!(value["alive_hosts"][0]["open_ports"][0].get("banner").is_none());
    assert_eq!(value["dead_hosts"], serde_json::json!([]));
}
