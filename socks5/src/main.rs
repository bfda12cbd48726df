use anyhow::{Context, Result};
use clap::Parser;

use socks5::config::{Args, USAGE};
use socks5::Server;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let Some(config) = args.into_config() else {
        println!("{}", USAGE);
        return Ok(());
    };

    let server = Server::bind(&config)
        .await
        .with_context(|| format!("监听 {} 失败", config.listen))?;
    server.run().await?;

    Ok(())
}
