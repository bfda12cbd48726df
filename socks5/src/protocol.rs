// SOCKS5 协议常量 (RFC 1928 子集)
pub const SOCKS_VERSION: u8 = 0x05;

pub const NO_AUTHENTICATION: u8 = 0x00;
pub const NO_ACCEPTABLE_METHODS: u8 = 0xFF;

pub const CONNECT_COMMAND: u8 = 0x01;

pub const IPV4_ADDRESS: u8 = 0x01;
pub const DOMAIN_NAME: u8 = 0x03;

pub const RESERVED: u8 = 0x00;

/// Longest domain name accepted in a CONNECT request.
pub const MAX_DOMAIN_LEN: usize = 253;

/// Length of every command reply frame.
pub const REPLY_LEN: usize = 10;

/// REP field of a command reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Succeeded,
    /// Sent when the backend dial fails.
    GeneralFailure,
    CommandNotSupported,
    AddressTypeNotSupported,
}

impl Reply {
    pub fn as_u8(self) -> u8 {
        match self {
            Reply::Succeeded => 0x00,
            Reply::GeneralFailure => 0x05,
            Reply::CommandNotSupported => 0x07,
            Reply::AddressTypeNotSupported => 0x08,
        }
    }
}
