use log::{info, warn};
use tokio::net::TcpStream;

use crate::address::TargetAddr;
use crate::error::{Error, Result};

/// Dials the requested backend.
///
/// There is no timeout: a backend that never answers keeps the session
/// waiting here until the OS gives up on the connect.
pub async fn connect(target: &TargetAddr) -> Result<TcpStream> {
    info!("尝试连接到 {}...", target);

    let result = match target {
        TargetAddr::Ipv4(addr) => TcpStream::connect(*addr).await,
        TargetAddr::Domain(name, port) => TcpStream::connect((name.as_str(), *port)).await,
    };

    result.map_err(|source| {
        warn!("连接 {} 失败: {}", target, source);
        Error::Connect {
            target: target.to_string(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_ipv4() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = match listener.local_addr().unwrap() {
            std::net::SocketAddr::V4(v4) => v4,
            other => panic!("unexpected listener address {}", other),
        };

        let stream = connect(&TargetAddr::Ipv4(addr)).await.unwrap();
        assert_eq!(stream.peer_addr().unwrap(), std::net::SocketAddr::V4(addr));
    }

    #[tokio::test]
    async fn test_connect_domain() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        // 字面 IP 也可以作为域名
        let target = TargetAddr::Domain("127.0.0.1".to_string(), port);
        let stream = connect(&target).await.unwrap();
        assert_eq!(stream.peer_addr().unwrap().port(), port);
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = match listener.local_addr().unwrap() {
            std::net::SocketAddr::V4(v4) => v4,
            other => panic!("unexpected listener address {}", other),
        };
        drop(listener);

        let err = connect(&TargetAddr::Ipv4(addr)).await.unwrap_err();
        match err {
            Error::Connect { target, .. } => assert_eq!(target, addr.to_string()),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
