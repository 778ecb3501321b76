// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use zhonghong_bridge::{Config, PollLoop, Synchronizer, serve_commands};

#[derive(Parser)]
#[command(name = "zhonghong-bridge")]
#[command(about = "Bridge between a Zhonghong HVAC gateway and MQTT")]
struct Cli {
    /// Path to the TOML configuration file. Defaults to /config.toml when present.
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // RUST_LOG controls verbosity, default is info.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Bridge stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> zhonghong_bridge::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let layout = config.bridge;

    let gateway = config.gateway_config().into_client()?;
    tracing::info!(url = %gateway.base_url(), "Gateway client ready");

    let (broker, inbound) = config.mqtt_builder().build().await?;

    broker.subscribe(&layout.subscription_filters()).await?;

    let synchronizer = Arc::new(Synchronizer::new(gateway, broker, layout));

    let mut poll = tokio::spawn(PollLoop::new(Arc::clone(&synchronizer)).run());
    let mut commands = tokio::spawn(serve_commands(Arc::clone(&synchronizer), inbound));

    tokio::select! {
        () = shutdown_signal() => tracing::info!("Shutting down"),
        _ = &mut poll => tracing::error!("Poll loop exited"),
        _ = &mut commands => tracing::error!("Command handler exited"),
    }

    poll.abort();
    commands.abort();

    if let Err(e) = synchronizer.publisher().disconnect().await {
        tracing::warn!(error = %e, "Failed to disconnect from broker");
    }
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
                return;
            }
            Err(e) => tracing::warn!(error = %e, "Cannot listen for SIGTERM"),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
