//! neural-style server - stylize a content image with the look of a style image.

use std::net::{IpAddr, SocketAddr};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use neural_style::model::{ModelCache, ModelSource};
use neural_style::server::{self, ServerConfig};
use neural_style::{Config, Pipeline};

/// Serve arbitrary image style transfer over HTTP.
#[derive(Parser, Debug)]
#[command(name = "neural-style")]
#[command(version, about, long_about = None)]
struct Args {
    /// ONNX style transfer model: a local path or an http(s) URL to download once.
    #[arg(short, long, value_name = "PATH|URL")]
    model: String,

    /// Address to listen on.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value = "5000")]
    port: u16,

    /// Enable debug logging.
    #[arg(long, env = "DEBUG")]
    debug: bool,

    /// Longest side, in pixels, of images fed to the model.
    #[arg(long, default_value = "512", value_name = "INT")]
    max_size: u32,

    /// JPEG quality (1-100) of normalized and stylized images.
    #[arg(short, long, default_value = "95", value_name = "INT")]
    quality: u8,

    /// Largest accepted request body in MiB.
    #[arg(long, default_value = "32", value_name = "INT")]
    max_upload_mb: usize,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("neural_style={log_level},tower_http={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<()> {
    let config = Config {
        max_size: args.max_size,
        output_quality: args.quality,
    };
    config.validate().context("Invalid pipeline configuration")?;

    // Loaded before the runtime starts: downloads use a blocking client
    let source = ModelSource::parse(&args.model);
    let model = ModelCache::new()
        .and_then(|cache| cache.load(&source))
        .context("Failed to load style model")?;

    let pipeline =
        Pipeline::new(config, Arc::new(model)).context("Failed to initialize pipeline")?;

    let server_config = ServerConfig {
        addr: SocketAddr::new(args.host, args.port),
        max_upload_bytes: args.max_upload_mb.saturating_mul(1024 * 1024),
    };
    let app = server::create_app(pipeline, &server_config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime
        .block_on(server::serve(app, &server_config))
        .with_context(|| format!("Server on {} failed", server_config.addr))?;

    Ok(())
}
