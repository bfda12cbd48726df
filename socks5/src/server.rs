use std::net::SocketAddr;
use std::sync::Arc;

use log::{error, info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::error::Result;
use crate::session::{Outcome, Session};

/// Listener settings, built from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `host:port` to listen on
    pub listen: String,
    /// Upper bound on sessions served at once. `None` means unbounded.
    pub max_connections: Option<usize>,
}

impl Config {
    pub fn new(listen: impl Into<String>) -> Self {
        Self {
            listen: listen.into(),
            max_connections: None,
        }
    }
}

/// Accepts client connections and runs one [`Session`] task per connection.
pub struct Server {
    listener: TcpListener,
    /// Connection limit semaphore (None = unlimited)
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl Server {
    pub async fn bind(config: &Config) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen).await?;

        let connection_semaphore = match config.max_connections {
            Some(max) if max > 0 => {
                info!("正在监听 {} (最多 {} 个连接)", listener.local_addr()?, max);
                Some(Arc::new(Semaphore::new(max)))
            }
            _ => {
                info!("正在监听 {}...", listener.local_addr()?);
                None
            }
        };

        Ok(Self {
            listener,
            connection_semaphore,
        })
    }

    /// Useful when bound to port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop. Never returns under normal operation.
    pub async fn run(self) -> Result<()> {
        loop {
            // 达到上限时等待空闲名额, 连接留在 backlog 中
            let permit = match &self.connection_semaphore {
                Some(semaphore) => match Arc::clone(semaphore).acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(e) => {
                        error!("连接限制信号量已关闭: {}", e);
                        return Ok(());
                    }
                },
                None => None,
            };

            match self.listener.accept().await {
                Ok((socket, addr)) => {
                    tokio::spawn(async move {
                        serve_connection(socket, addr).await;
                        drop(permit);
                    });
                }
                Err(e) => {
                    error!("接受连接时出错: {}", e);
                }
            }
        }
    }
}

/// Runs one session to completion and logs how it ended.
///
/// Every failure stays inside this task: nothing is returned to the
/// acceptor. Both sockets are owned by the session and are closed by the
/// time this returns.
pub async fn serve_connection(socket: TcpStream, peer: SocketAddr) {
    info!("新连接来自: {}", peer);

    match Session::new(socket, peer).run().await {
        Ok(Outcome::Relayed(stats)) => {
            info!(
                "{} 转发结束: 上行 {} 字节, 下行 {} 字节",
                peer, stats.upstream, stats.downstream
            );
        }
        Ok(Outcome::NoAcceptableMethod) => {
            info!("{} 未提供无认证方法, 已拒绝", peer);
        }
        Ok(Outcome::CommandNotSupported(command)) => {
            info!("{} 请求了不支持的命令: {:#04x}", peer, command);
        }
        Ok(Outcome::AddressTypeNotSupported(address_type)) => {
            info!("{} 请求了不支持的地址类型: {:#04x}", peer, address_type);
        }
        Err(e) if e.is_protocol_violation() => {
            warn!("{} 协议错误: {}", peer, e);
        }
        Err(e) => {
            warn!("处理 {} 的连接时出错: {}", peer, e);
        }
    }

    info!("连接已断开: {}", peer);
}
