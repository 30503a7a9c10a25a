// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Superwall bridge host process.
//
// Entry point. Initialises logging and configuration, then serves bridge
// requests as JSON lines on stdin/stdout against the in-memory SDK. Logs go to
// stderr so stdout carries protocol lines only. Closing stdin tears the
// bridge down.

mod wire;

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use superwall_bridge::{BridgeHost, InMemorySdk, Response};
use superwall_core::{BridgeConfig, BridgeError};

use wire::{Inbound, Outbound, Request, StdioMessenger};

/// Environment variable naming the config file when no argument is given.
const CONFIG_ENV: &str = "SUPERWALL_BRIDGE_CONFIG";

/// How long in-flight requests may finish after stdin closes.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("superwall-host starting");

    let config = load_config();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_lines(out_rx));

    let messenger = Arc::new(StdioMessenger::new(out_tx.clone()));
    let host = Arc::new(BridgeHost::new(
        Arc::new(InMemorySdk::new()),
        messenger.clone(),
        config,
    ));
    tracing::info!(superwall_bridge_id = %host.superwall_bridge_id(), "serving on stdio");

    let mut tasks = JoinSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "failed to read stdin");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Ok(Inbound::Reply { reply_to, response }) => messenger.complete(reply_to, response),
            Ok(Inbound::Request(request)) => {
                let host = Arc::clone(&host);
                let out = out_tx.clone();
                tasks.spawn(async move {
                    let response = dispatch(&host, &request).await;
                    let _ = out.send(Outbound::Reply {
                        request_id: request.request_id,
                        response,
                    });
                });
            }
            Err((request_id, response)) => {
                let _ = out_tx.send(Outbound::Reply {
                    request_id,
                    response,
                });
            }
        }
        // Reap finished requests so the set does not grow unbounded.
        while tasks.try_join_next().is_some() {}
    }

    tracing::info!(in_flight = tasks.len(), "stdin closed, shutting down");
    messenger.close();
    if tokio::time::timeout(SHUTDOWN_GRACE, drain(&mut tasks)).await.is_err() {
        tracing::warn!(remaining = tasks.len(), "requests still running after grace period");
    }
    host.teardown();
    drain(&mut tasks).await;

    drop(out_tx);
    drop(host);
    drop(messenger);
    if let Err(e) = writer.await {
        tracing::error!(error = %e, "output writer failed");
    }
}

fn load_config() -> BridgeConfig {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV).ok());
    let Some(path) = path else {
        return BridgeConfig::default();
    };
    match BridgeConfig::load(&path) {
        Ok(config) => {
            tracing::info!(%path, "configuration loaded");
            config
        }
        Err(e) => {
            tracing::warn!(%path, error = %e, "unreadable configuration, using defaults");
            BridgeConfig::default()
        }
    }
}

/// Decode one inbound line. Undecodable requests still get an error reply,
/// echoing their `requestId` when one can be found.
fn parse_line(line: &str) -> Result<Inbound, (Option<Value>, Response)> {
    let raw: Value = serde_json::from_str(line)
        .map_err(|e| (None, Response::from(BridgeError::Serialization(e))))?;
    let request_id = raw.get("requestId").cloned();
    serde_json::from_value(raw).map_err(|e| {
        let err = BridgeError::bad_args("<request>", e.to_string());
        (request_id, Response::from(err))
    })
}

async fn dispatch(host: &BridgeHost, request: &Request) -> Response {
    match &request.bridge_id {
        Some(bridge_id) => host.invoke(bridge_id, request.call()).await,
        None => host.invoke_creator(&request.call()),
    }
}

async fn drain(tasks: &mut JoinSet<()>) {
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "request task failed");
        }
    }
}

async fn write_lines(mut rx: mpsc::UnboundedReceiver<Outbound>) {
    let mut stdout = tokio::io::stdout();
    while let Some(line) = rx.recv().await {
        let mut encoded = match serde_json::to_vec(&line) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode output line");
                continue;
            }
        };
        encoded.push(b'\n');
        if let Err(e) = stdout.write_all(&encoded).await {
            tracing::error!(error = %e, "stdout closed");
            return;
        }
        let _ = stdout.flush().await;
    }
}
