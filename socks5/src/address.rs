use std::fmt::{self, Display, Formatter};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Error, Result};
use crate::protocol::{DOMAIN_NAME, IPV4_ADDRESS, MAX_DOMAIN_LEN, REPLY_LEN, Reply, SOCKS_VERSION};

/// ATYP values this server can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressType {
    Ipv4,
    Domain,
}

impl AddressType {
    pub fn from_u8(atyp: u8) -> Option<Self> {
        match atyp {
            IPV4_ADDRESS => Some(AddressType::Ipv4),
            DOMAIN_NAME => Some(AddressType::Domain),
            _ => None,
        }
    }
}

/// Destination of a CONNECT request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAddr {
    Ipv4(SocketAddrV4),
    Domain(String, u16),
}

impl Display for TargetAddr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TargetAddr::Ipv4(addr) => addr.fmt(f),
            TargetAddr::Domain(name, port) => write!(f, "{}:{}", name, port),
        }
    }
}

/// Reads DST.ADDR and DST.PORT for the given ATYP.
pub async fn read_target<R>(reader: &mut R, address_type: AddressType) -> Result<TargetAddr>
where
    R: AsyncRead + Unpin,
{
    match address_type {
        AddressType::Ipv4 => {
            let mut buf = [0u8; 6];
            reader.read_exact(&mut buf).await?;
            let ip = Ipv4Addr::new(buf[0], buf[1], buf[2], buf[3]);
            let port = u16::from_be_bytes([buf[4], buf[5]]);
            Ok(TargetAddr::Ipv4(SocketAddrV4::new(ip, port)))
        }
        AddressType::Domain => {
            let len = reader.read_u8().await? as usize;
            if len > MAX_DOMAIN_LEN {
                return Err(Error::DomainTooLong(len));
            }

            // 域名 + 2 字节端口
            let mut buf = vec![0u8; len + 2];
            reader.read_exact(&mut buf).await?;
            let port = u16::from_be_bytes([buf[len], buf[len + 1]]);
            let name = String::from_utf8_lossy(&buf[..len]).into_owned();
            Ok(TargetAddr::Domain(name, port))
        }
    }
}

/// Converts the backend connection's remote address into the BND.ADDR and
/// BND.PORT of a reply. Only IPv4 can be represented.
pub fn bound_endpoint(addr: SocketAddr) -> Result<SocketAddrV4> {
    match addr {
        SocketAddr::V4(v4) => Ok(v4),
        SocketAddr::V6(v6) => match v6.ip().to_ipv4_mapped() {
            Some(ip) => Ok(SocketAddrV4::new(ip, v6.port())),
            None => Err(Error::NotIpv4(addr)),
        },
    }
}

/// Builds the 10-byte command reply. Failures carry an all-zero address.
pub fn encode_reply(reply: Reply, bound: Option<SocketAddrV4>) -> BytesMut {
    let bound = bound.unwrap_or_else(|| SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0));

    let mut buf = BytesMut::with_capacity(REPLY_LEN);
    buf.put_u8(SOCKS_VERSION);
    buf.put_u8(reply.as_u8());
    buf.put_u8(0x00);
    buf.put_u8(IPV4_ADDRESS);
    buf.put_slice(&bound.ip().octets());
    buf.put_u16(bound.port());
    buf
}
