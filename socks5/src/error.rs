use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors that end a session.
///
/// Negotiated rejections (no acceptable method, unsupported command or
/// address type) are not errors; see [`crate::session::Outcome`].
#[derive(Error, Debug)]
pub enum Error {
    /// VER byte of a greeting or request was not 5
    #[error("unsupported SOCKS version: {0:#04x}")]
    BadVersion(u8),

    /// RSV byte of a request was not 0
    #[error("non-zero reserved byte: {0:#04x}")]
    BadReserved(u8),

    #[error("domain name too long: {0} bytes")]
    DomainTooLong(usize),

    /// The backend connection's remote address cannot be put in a reply
    #[error("backend address is not IPv4: {0}")]
    NotIpv4(SocketAddr),

    #[error("failed to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: io::Error,
    },

    /// Short reads surface here as `UnexpectedEof`
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for malformed client input: bad version or reserved byte,
    /// oversized domain name, or a frame cut short by the peer.
    pub fn is_protocol_violation(&self) -> bool {
        match self {
            Error::BadVersion(_) | Error::BadReserved(_) | Error::DomainTooLong(_) => true,
            Error::Io(e) => e.kind() == io::ErrorKind::UnexpectedEof,
            Error::NotIpv4(_) | Error::Connect { .. } => false,
        }
    }
}
