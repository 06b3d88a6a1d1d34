use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use image_detection::config::{API_KEY_ENV, DEFAULT_ENDPOINT};
use image_detection::{ImageEncoder, ImagePayload, RequestShape, VisionClient, VisionConfig, format_labels};

/// Label an image with a cloud vision annotate endpoint.
#[derive(Parser, Debug)]
#[command(name = "detect")]
#[command(about = "🔎 Send an image to the vision API and print its labels")]
#[command(long_about = "Encode an image (resized to 800px wide when its PNG form exceeds 2 MiB),
send it to the vision annotate endpoint, and print each label as `description = score`.")]
struct Args {
    /// Image file to analyze (PNG or JPEG)
    image: PathBuf,

    /// API key sent as the `key` query parameter
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: String,

    /// Service base URL
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Send `requests` as a one-element array instead of a single object
    #[arg(long, help = "Use the documented array form of the request body")]
    batch: bool,

    /// Request timeout in seconds (HTTP stack default when omitted)
    #[arg(short, long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut config = VisionConfig::new(args.api_key).with_endpoint(args.endpoint);
    if args.batch {
        config = config.with_request_shape(RequestShape::Batch);
    }
    if let Some(secs) = args.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }

    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("reading {}", args.image.display()))?;
    let image = ImagePayload::decode(&bytes)?;
    let encoder = ImageEncoder::new(&config);
    let client = VisionClient::new(config)?;

    let labels = client.analyze(&encoder, &image).await?;
    if labels.is_empty() {
        println!("No labels found.");
    } else {
        println!("{}", format_labels(&labels).trim_start());
    }
    Ok(())
}
