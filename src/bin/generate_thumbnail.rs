use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thumbsmith::client::GeminiClient;
use thumbsmith::config::{GeminiSettings, setup_logging};
use thumbsmith::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_GEMINI_MODEL, DEFAULT_REQUEST_TIMEOUT_SECONDS,
    LOADING_MESSAGES, NARRATOR_INTERVAL,
};
use thumbsmith::narrator::Narrator;
use thumbsmith::orchestrator::{Generator, LifecycleState, SubmitOutcome};
use thumbsmith::payload::ImagePayload;

/// Generate a video thumbnail from the command line.
///
/// Minimal UX:
///   generate_thumbnail "My Epic Vlog" ./me.jpg
#[derive(Parser, Debug)]
#[command(name = "generate_thumbnail")]
#[command(about = "Generate a thumbnail from a video title and a headshot via Gemini")]
struct Args {
    /// Video title to feature on the thumbnail
    title: String,

    /// Headshot image (PNG or JPEG)
    headshot: PathBuf,

    /// Gemini API key
    #[arg(required = true, long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: String,

    /// Image model
    #[arg(long, default_value = DEFAULT_GEMINI_MODEL, env = "THUMBSMITH_MODEL")]
    model: String,

    /// Base URL of the Gemini REST API
    #[arg(long, default_value = DEFAULT_API_BASE_URL, env = "THUMBSMITH_API_BASE_URL")]
    api_base_url: String,

    /// Seconds to wait for the generation call
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECONDS)]
    request_timeout: u64,

    /// Output file, the extension follows the returned image type when omitted
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Overwrite the output file if it exists
    #[arg(long)]
    force: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.debug).map_err(|err| anyhow!("Failed to set up logging: {err}"))?;

    if let Some(output) = &args.output
        && output.exists()
        && !args.force
    {
        bail!("Output already exists: {}", output.display());
    }

    let headshot = ImagePayload::from_path(&args.headshot)
        .await
        .with_context(|| format!("Failed to read headshot {}", args.headshot.display()))?;

    let settings = GeminiSettings::new(
        &args.gemini_api_key,
        &args.model,
        &args.api_base_url,
        Duration::from_secs(args.request_timeout),
    )?;
    let client = GeminiClient::new(settings)?;

    let generator = Generator::new(client, Narrator::new(LOADING_MESSAGES, NARRATOR_INTERVAL));
    generator.set_title(args.title.as_str()).await;
    generator.set_headshot(headshot).await;

    let mut updates = generator.narrator().subscribe();
    let printer = tokio::spawn(async move {
        while let Some(message) = updates.next().await {
            eprintln!("{message}");
        }
    });

    let outcome = generator.generate().await;
    printer.abort();

    let state = generator.state();
    match (outcome, state.lifecycle()) {
        (SubmitOutcome::Started(_), LifecycleState::Succeeded { thumbnail }) => {
            let bytes = thumbnail
                .decode()
                .context("Failed to decode the generated thumbnail")?;
            let output = args.output.unwrap_or_else(|| {
                PathBuf::from(format!("thumbnail.{}", extension_for(&thumbnail.mime_type)))
            });
            if output.exists() && !args.force {
                bail!("Output already exists: {}", output.display());
            }
            if let Some(parent) = output.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(&output, &bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Wrote {}", output.display());
            Ok(())
        }
        (_, LifecycleState::Failed { message }) => bail!("{message}"),
        (outcome, lifecycle) => bail!(
            "Generation did not finish ({:?}, state {})",
            outcome,
            lifecycle.label()
        ),
    }
}
