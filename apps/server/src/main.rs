use anyhow::Context;
use rollcall::domain::config::ApiConfig;
use rollcall::kernel::config::load_config;
use rollcall_server::{Server, init_logging};

/// Usage: `rollcall-server [config-file]`. Without a file, `server.toml` is read when present.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1);
    let cfg: ApiConfig = load_config(path).context("Critical: Configuration is malformed")?;

    let _log = init_logging(env!("CARGO_PKG_NAME"), &cfg.logging)?;

    Server::builder().config(cfg).build().await?.run().await
}
