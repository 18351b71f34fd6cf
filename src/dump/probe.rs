use std::time::Duration;

use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::error::DumpError;

pub const DEFAULT_MONGO_PORT: u16 = 27017;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Host list of a `mongodb://` URI with credentials and options stripped.
/// Returns `None` when there is nothing to dial over TCP: `mongodb+srv://`,
/// whose host is a DNS SRV name, and URIs naming a Unix domain socket.
pub fn mongo_hosts(uri: &str) -> Option<Vec<(String, u16)>> {
    let rest = uri.strip_prefix("mongodb://")?;
    let authority = rest.split(['/', '?']).next().unwrap_or_default();
    let hosts = authority.rsplit_once('@').map_or(authority, |(_, hosts)| hosts);

    let hosts: Vec<&str> = hosts.split(',').filter(|h| !h.is_empty()).collect();
    if hosts.iter().any(|h| is_unix_socket(h)) {
        return None;
    }
    Some(hosts.into_iter().map(split_host_port).collect())
}

/// `%2Ftmp%2Fmongodb-27017.sock`, the escaped socket path form.
fn is_unix_socket(host: &str) -> bool {
    let lower = host.to_ascii_lowercase();
    lower.starts_with("%2f") || lower.ends_with(".sock")
}

fn split_host_port(location: &str) -> (String, u16) {
    // [::1]:27018
    if let Some(rest) = location.strip_prefix('[') {
        if let Some((host, tail)) = rest.split_once(']') {
            let port = tail
                .strip_prefix(':')
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_MONGO_PORT);
            return (host.to_string(), port);
        }
    }
    match location.rsplit_once(':') {
        Some((host, port)) => match port.parse() {
            Ok(port) => (host.to_string(), port),
            Err(_) => (location.to_string(), DEFAULT_MONGO_PORT),
        },
        None => (location.to_string(), DEFAULT_MONGO_PORT),
    }
}

/// Succeeds as soon as one host of the URI accepts a TCP connection.
pub async fn probe(uri: &str) -> Result<(), DumpError> {
    let Some(hosts) = mongo_hosts(uri) else {
        debug!("SRV or Unix socket connection string, skipping reachability check");
        return Ok(());
    };

    for (host, port) in &hosts {
        match tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect((host.as_str(), *port)))
            .await
        {
            Ok(Ok(_)) => {
                debug!("MongoDB is serving at {host}:{port}");
                return Ok(());
            }
            Ok(Err(e)) => warn!("MongoDB is not serving at {host}:{port}: {e}"),
            Err(_) => warn!("MongoDB at {host}:{port} did not answer within {CONNECT_TIMEOUT:?}"),
        }
    }

    Err(DumpError::Unreachable {
        hosts: hosts
            .iter()
            .map(|(host, port)| format!("{host}:{port}"))
            .collect::<Vec<_>>()
            .join(","),
    })
}
