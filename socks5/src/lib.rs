//! A minimal SOCKS5 proxy server.
//!
//! Supports the "no authentication" method, the CONNECT command, and IPv4 or
//! domain-name destinations. Each accepted connection runs as its own task
//! and relays bytes to the requested backend until either side closes.

pub mod address;
pub mod config;
pub mod connector;
pub mod error;
pub mod protocol;
pub mod relay;
pub mod server;
pub mod session;

pub use error::{Error, Result};
pub use server::{Config, Server};
