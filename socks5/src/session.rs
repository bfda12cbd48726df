use std::net::SocketAddr;

use log::{debug, info};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::address::{self, AddressType, TargetAddr};
use crate::connector;
use crate::error::{Error, Result};
use crate::protocol::{
    CONNECT_COMMAND, NO_ACCEPTABLE_METHODS, NO_AUTHENTICATION, RESERVED, Reply, SOCKS_VERSION,
};
use crate::relay::{self, BridgeStats};

/// How a session ended when it did not fail.
#[derive(Debug)]
pub enum Outcome {
    /// CONNECT succeeded and the bridge ran to completion
    Relayed(BridgeStats),
    /// The client offered no method we accept; `0xFF` was sent
    NoAcceptableMethod,
    /// CMD was not CONNECT; REP `0x07` was sent
    CommandNotSupported(u8),
    /// ATYP was neither IPv4 nor domain; REP `0x08` was sent
    AddressTypeNotSupported(u8),
}

/// Fixed part of a command request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    pub command: u8,
    pub address_type: u8,
}

/// Reads VER, NMETHODS and METHODS, returning the offered methods.
pub async fn read_greeting<R>(reader: &mut R) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf).await?;

    let version = buf[0];
    let nmethods = buf[1];
    if version != SOCKS_VERSION {
        return Err(Error::BadVersion(version));
    }

    let mut methods = vec![0u8; nmethods as usize];
    reader.read_exact(&mut methods).await?;
    Ok(methods)
}

/// Only "no authentication" is ever selected.
pub fn select_method(methods: &[u8]) -> u8 {
    if methods.contains(&NO_AUTHENTICATION) {
        NO_AUTHENTICATION
    } else {
        NO_ACCEPTABLE_METHODS
    }
}

/// Reads VER, CMD, RSV and ATYP of a command request.
pub async fn read_request<R>(reader: &mut R) -> Result<RequestHeader>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).await?;

    let version = buf[0];
    let reserved = buf[2];
    if version != SOCKS_VERSION {
        return Err(Error::BadVersion(version));
    }
    if reserved != RESERVED {
        return Err(Error::BadReserved(reserved));
    }

    Ok(RequestHeader {
        command: buf[1],
        address_type: buf[3],
    })
}

/// One client connection, from greeting to the end of the relay.
///
/// The session owns the client stream and, once dialled, the backend
/// stream; both are closed when `run` returns, whichever way it returns.
pub struct Session<S> {
    front: S,
    peer: SocketAddr,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(front: S, peer: SocketAddr) -> Self {
        Self { front, peer }
    }

    pub async fn run(mut self) -> Result<Outcome> {
        // 处理握手
        let methods = read_greeting(&mut self.front).await?;
        let method = select_method(&methods);
        self.front.write_all(&[SOCKS_VERSION, method]).await?;
        if method == NO_ACCEPTABLE_METHODS {
            return Ok(Outcome::NoAcceptableMethod);
        }

        // 处理请求
        let request = read_request(&mut self.front).await?;
        if request.command != CONNECT_COMMAND {
            self.reply(Reply::CommandNotSupported).await?;
            return Ok(Outcome::CommandNotSupported(request.command));
        }
        let Some(address_type) = AddressType::from_u8(request.address_type) else {
            self.reply(Reply::AddressTypeNotSupported).await?;
            return Ok(Outcome::AddressTypeNotSupported(request.address_type));
        };

        let target = address::read_target(&mut self.front, address_type).await?;
        self.connect(target).await
    }

    async fn connect(mut self, target: TargetAddr) -> Result<Outcome> {
        info!("{} -> {}", self.peer, target);

        let backend = match connector::connect(&target).await {
            Ok(backend) => backend,
            Err(e) => {
                if let Err(write_err) = self.reply(Reply::GeneralFailure).await {
                    debug!("向 {} 发送失败响应出错: {}", self.peer, write_err);
                }
                return Err(e);
            }
        };

        let backend_addr = backend.peer_addr()?;
        let bound = address::bound_endpoint(backend_addr)?;
        info!("已连接后端 {} ({})", target, backend_addr);

        self.front
            .write_all(&address::encode_reply(Reply::Succeeded, Some(bound)))
            .await?;

        // 开始转发数据
        let stats = relay::bridge(self.front, backend).await;
        info!("后端已断开 {} ({})", target, backend_addr);
        Ok(Outcome::Relayed(stats))
    }

    async fn reply(&mut self, reply: Reply) -> Result<()> {
        self.front
            .write_all(&address::encode_reply(reply, None))
            .await?;
        Ok(())
    }
}
