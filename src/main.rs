//! Broadcast Relay command line tool
//!
//! Exits with status 1 whenever the relay stops on its own.

use clap::Parser;
use log::{error, info, warn};

use broadcast_relay::common::{init_logger, set_log_level, Result};
use broadcast_relay::config::{self, Args};
use broadcast_relay::{Relay, APP_NAME, VERSION};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logger(config::early_log_level(&args));

    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = config::auto_load(args)?;

    set_log_level(config::log_level_filter(config.log_level()));
    info!("Starting {} v{}", APP_NAME, VERSION);

    for warning in config::check_warnings(&config) {
        warn!("{}", warning);
    }

    info!("Upstream address: {}", config.upstream());
    info!("Listen address: {}", config.listen());

    let relay = Relay::bind(&config).await?;

    info!("Relay ready, press Ctrl+C to stop");

    tokio::select! {
        result = relay.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    }
}
