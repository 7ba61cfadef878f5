//! Runs a Sharedesk server configured from the environment.
//!
//! | variable                      | default          |
//! |-------------------------------|------------------|
//! | `SHAREDESK_BIND`              | `127.0.0.1:8080` |
//! | `SHAREDESK_ADMIN_PASSWORD`    | `admin`          |
//! | `SHAREDESK_PASSWORD`          | `neko`           |
//! | `SHAREDESK_IMPLICIT_HOSTING`  | `true`           |
//!
//! Log verbosity follows `RUST_LOG`.

use std::sync::atomic::{AtomicBool, Ordering};

use sharedesk::prelude::*;
use tracing_subscriber::EnvFilter;

/// Stands in for a real screen grabber: remembers whether it is running
/// and logs transitions.
#[derive(Default)]
struct LoggingCapture {
    running: AtomicBool,
}

impl CaptureManager for LoggingCapture {
    fn streaming(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn start_stream(&self) {
        self.running.store(true, Ordering::SeqCst);
        tracing::info!("capture started");
    }

    fn stop_stream(&self) {
        self.running.store(false, Ordering::SeqCst);
        tracing::info!("capture stopped");
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<(), SharedeskError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bind = env_or("SHAREDESK_BIND", "127.0.0.1:8080");
    let implicit = env_or("SHAREDESK_IMPLICIT_HOSTING", "true");
    let implicit_hosting = parse_flag(&implicit).unwrap_or_else(|| {
        tracing::warn!(value = %implicit, "unrecognized SHAREDESK_IMPLICIT_HOSTING, using true");
        true
    });

    let config = SessionConfig {
        admin_password: env_or("SHAREDESK_ADMIN_PASSWORD", "admin"),
        password: env_or("SHAREDESK_PASSWORD", "neko"),
        implicit_hosting,
    };

    let server = SharedeskServer::builder()
        .bind(&bind)
        .session_config(config)
        .build(LoggingCapture::default())
        .await?;

    tracing::info!(addr = ?server.local_addr().ok(), implicit_hosting, "listening");
    server.run().await
}
