use clap::Parser;

use crate::server::Config;

#[derive(Parser, Debug)]
#[command(name = "socks5")]
#[command(about = "Minimal SOCKS5 proxy server (no auth, CONNECT only)")]
pub struct Args {
    /// Listen address, e.g. 0.0.0.0:1080
    #[arg(value_name = "LISTEN")]
    pub listen: Option<String>,

    /// Maximum number of concurrent sessions (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    pub max_connections: usize,
}

impl Args {
    /// `None` when no listen address was given.
    pub fn into_config(self) -> Option<Config> {
        let listen = self.listen?;
        Some(Config {
            listen,
            max_connections: (self.max_connections > 0).then_some(self.max_connections),
        })
    }
}

pub const USAGE: &str = "Usage: socks5 LISTEN";
