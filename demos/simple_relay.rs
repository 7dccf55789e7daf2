//! Simple relay example
//!
//! Starts a toy upstream that greets every second, then relays it to any
//! number of clients on 127.0.0.1:9090. Try `nc 127.0.0.1 9090` in two shells.

use std::time::Duration;

use broadcast_relay::config::{ConfigBuilder, RelayConfig};
use broadcast_relay::{Relay, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let app = TcpListener::bind("127.0.0.1:0").await?;
    let app_addr = app.local_addr()?;

    tokio::spawn(async move {
        let Ok((mut stream, _)) = app.accept().await else {
            return;
        };
        let mut buf = [0u8; 1024];
        let mut tick: u64 = 0;
        loop {
            tokio::select! {
                read = stream.read(&mut buf) => match read {
                    Ok(0) | Err(_) => return,
                    Ok(n) => println!("upstream got: {}", String::from_utf8_lossy(&buf[..n])),
                },
                _ = tokio::time::sleep(Duration::from_secs(1)) => {
                    tick += 1;
                    if stream.write_all(format!("tick {}\n", tick).as_bytes()).await.is_err() {
                        return;
                    }
                }
            }
        }
    });

    let mut overrides = RelayConfig::empty();
    overrides.values.upstream = Some(app_addr);

    let config = ConfigBuilder::new().with_defaults().build()?.merge(
        &overrides,
        broadcast_relay::config::ValueSource::CommandLine,
    );

    println!("Relaying {} to {}", config.upstream(), config.listen());
    Relay::bind(&config).await?.run().await
}
