use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use media_engine::config::SamplingPolicy;
use media_engine::protocol::{error_envelope, handle_value};
use media_engine::{Engine, EngineConfig, EngineError};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// JSON-lines bridge to the media engine.
///
/// Reads one request object per line on stdin and writes one response per
/// line on stdout. Requests run concurrently, so responses may arrive out of
/// order; include an "id" field to correlate them.
#[derive(Parser, Debug)]
#[command(name = "media-engine")]
#[command(about = "Score, sample, upscale and split media over a JSON-lines channel")]
struct Args {
    /// Engine configuration file (JSON); omitted fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the hard cap on frames returned per video
    #[arg(long)]
    max_frames: Option<u32>,

    /// Sample every Nth decoded frame instead of the configured policy
    #[arg(long)]
    sample_every: Option<u32>,
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid config file {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    if let Some(max_frames) = args.max_frames {
        config.video.max_frames = max_frames;
    }
    if let Some(step) = args.sample_every {
        config.video.sampling = SamplingPolicy::EveryNth { step };
    }
    Ok(config)
}

/// Run one request line, echoing its `id` when present.
fn respond(engine: &Engine, line: &str) -> Value {
    let mut request: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            return error_envelope(&EngineError::invalid_argument(format!("malformed request: {}", e)));
        }
    };
    let id = request.as_object_mut().and_then(|obj| obj.remove("id"));
    let response = handle_value(engine, request);
    match id {
        Some(id) => json!({ "id": id, "response": response }),
        None => response,
    }
}

fn panic_response(line: &str) -> Value {
    let response = error_envelope(&EngineError::internal("request worker panicked"));
    let id = serde_json::from_str::<Value>(line)
        .ok()
        .and_then(|mut v| v.as_object_mut().and_then(|obj| obj.remove("id")));
    match id {
        Some(id) => json!({ "id": id, "response": response }),
        None => response,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let engine = Arc::new(Engine::new(config).map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?);
    info!("media engine ready");

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = rx.recv().await {
            stdout.write_all(line.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        let engine = Arc::clone(&engine);
        let tx = tx.clone();
        tokio::spawn(async move {
            let request = line.clone();
            let response = match tokio::task::spawn_blocking(move || respond(&engine, &request)).await {
                Ok(response) => response,
                Err(e) => {
                    error!(%e, "request worker failed");
                    panic_response(&line)
                }
            };
            if tx.send(response.to_string()).is_err() {
                debug!("output channel closed, dropping response");
            }
        });
    }

    // In-flight requests hold their own sender; the writer ends once they finish.
    drop(tx);
    writer.await.context("writer task failed")??;
    Ok(())
}
