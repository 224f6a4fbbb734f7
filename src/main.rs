//! readproxy - headless-browser rendering proxy.
//!
//! Entry point for the HTTP server and the one-shot render CLI.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use readproxy_api::{ProxyHandler, ProxyServer, ServerConfig};
use readproxy_browser::{
    BrowserSession, ChromiumConfig, ChromiumDriver, SelfTerminationGuard, SessionConfig,
};
use readproxy_core::RawRequest;
use readproxy_image::JpegFetcher;
use readproxy_render::ReadabilityExtractor;

/// readproxy CLI.
#[derive(Parser)]
#[command(name = "readproxy")]
#[command(about = "Headless-browser rendering proxy for readable pages")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Server host
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Server port
        #[arg(long, default_value_t = 8080)]
        port: u16,

        /// Chromium remote debugging port (0 lets Chromium pick a
        /// free one)
        #[arg(long, default_value_t = 0)]
        debug_port: u16,

        /// Chromium executable (probed when unset)
        #[arg(long)]
        chromium: Option<PathBuf>,

        /// Terminate the process this many seconds after a render,
        /// unless another request arrives first (0 disables). Meant
        /// for supervised or serverless deployments that respawn the
        /// process.
        #[arg(long, default_value_t = 0)]
        idle_exit_secs: u64,
    },

    /// Render one URL and print or save the resulting HTML
    Render {
        /// Target URL (or a full request path with prefix segments)
        url: String,

        /// Write the HTML to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Host header to build proxied links against
        #[arg(long, default_value = "localhost")]
        host: String,

        /// Forwarded protocol for proxied links
        #[arg(long, default_value = "http")]
        proto: String,

        /// Base-path prefix for proxied links
        #[arg(long, default_value = "")]
        prefix: String,

        /// Run the browser with a visible window
        #[arg(long)]
        headful: bool,

        /// Chromium remote debugging port (0 lets Chromium pick a
        /// free one)
        #[arg(long, default_value_t = 0)]
        debug_port: u16,

        /// Chromium executable (probed when unset)
        #[arg(long)]
        chromium: Option<PathBuf>,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

fn build_handler(chromium: ChromiumConfig) -> ProxyHandler {
    let driver = Arc::new(ChromiumDriver::new(chromium));
    let session = BrowserSession::new(driver, SessionConfig::default());

    ProxyHandler::new(
        Arc::new(session),
        Arc::new(ReadabilityExtractor::new()),
        Arc::new(JpegFetcher::new()),
    )
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve {
            host,
            port,
            debug_port,
            chromium,
            idle_exit_secs,
        } => {
            let mut handler = build_handler(ChromiumConfig {
                debug_port,
                executable: chromium,
                headless: true,
            });

            if idle_exit_secs > 0 {
                info!(idle_exit_secs, "self-termination guard enabled");
                handler = handler.with_guard(Arc::new(SelfTerminationGuard::new(
                    Duration::from_secs(idle_exit_secs),
                )));
            }

            let server = ProxyServer::new(ServerConfig::new(host, port), Arc::new(handler));
            if let Err(e) = server.run().await {
                error!("Server failed: {}", e);
                std::process::exit(1);
            }
        }

        Commands::Render {
            url,
            output,
            host,
            proto,
            prefix,
            headful,
            debug_port,
            chromium,
        } => {
            let handler = build_handler(ChromiumConfig {
                debug_port,
                executable: chromium,
                headless: !headful,
            });

            let raw_path = if url.starts_with('/') {
                url
            } else {
                format!("/{url}")
            };
            let mut request = RawRequest::new(raw_path)
                .with_header("host", host)
                .with_header("x-forwarded-proto", proto);
            if !prefix.is_empty() {
                request = request.with_header("x-forwarded-prefix", prefix);
            }

            let outcome = handler.handle(&request).await;
            if outcome.status_code != 200 {
                error!(
                    "Rendering failed ({}): {}",
                    outcome.status_code, outcome.body
                );
                std::process::exit(1);
            }

            match output {
                Some(path) => match tokio::fs::write(&path, &outcome.body).await {
                    Ok(()) => info!("Saved rendered HTML to {}", path.display()),
                    Err(e) => {
                        error!("Failed to write {}: {}", path.display(), e);
                        std::process::exit(1);
                    }
                },
                None => print!("{}", outcome.body),
            }
        }
    }
}
