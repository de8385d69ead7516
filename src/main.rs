use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use visualadapt::{
    default_image_candidates, default_text_candidates,
    logger::{self, LogLevel, LoggerConfig},
    AdaptConfig, AdaptationRequest, ErrorKind, GeminiClient, GenerationPipeline, Platform,
    SourceImage, TargetResolution,
};

#[derive(Debug, Parser)]
#[command(name = "visualadapt", version, about = "Adapt artwork to a social platform's aspect ratio")]
struct Cli {
    /// Source image (jpg, jpeg or png)
    image: PathBuf,
    /// tiktok, instagram, youtube, rednote or album-cover
    #[arg(long, short)]
    platform: Platform,
    /// Square output size: standard, hd, uhd or distribution (1:1 platforms only)
    #[arg(long, short)]
    resolution: Option<TargetResolution>,
    /// Extra direction for the art director
    #[arg(long, short)]
    instruction: Option<String>,
    /// Also render the image from the generated prompt
    #[arg(long)]
    render: bool,
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let dotenv_loaded = dotenv::dotenv().is_ok();
    let level = if cli.verbose { LogLevel::Debug } else { LogLevel::Info };
    if let Err(e) = logger::init_with_config(LoggerConfig::new().with_level(level)) {
        eprintln!("{}", e);
    }
    if !dotenv_loaded {
        log::debug!("No .env file found, using system environment variables");
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = AdaptConfig::from_env();
    logger::log_config_info(&config);

    let Some(api_key) = config.api_key.clone() else {
        log::error!("❌ Set GEMINI_API_KEY (or GOOGLE_API_KEY) to use the generator");
        return Ok(ExitCode::FAILURE);
    };

    let mut request = AdaptationRequest::new(SourceImage::from_path(&cli.image)?, cli.platform);
    if let Some(resolution) = cli.resolution {
        request = request.with_resolution(resolution)?;
    }
    if let Some(instruction) = cli.instruction {
        request = request.with_instruction(instruction);
    }

    let text_candidates = default_text_candidates();
    let image_candidates = cli.render.then(default_image_candidates);
    logger::log_candidates("Text", text_candidates);
    if let Some(candidates) = image_candidates {
        logger::log_candidates("Image", candidates);
    }

    let client = GeminiClient::new(&config)?;
    let pipeline = GenerationPipeline::new(client, config.retry_delay);
    log::info!("🔄 Generating adaptation prompt for {}...", request.target_platform);
    let result = pipeline
        .run(&request, &api_key, text_candidates, image_candidates)
        .await;

    if let Some(structured) = &result.prompt_stage.structured_prompt {
        log::info!(
            "✅ Prompt generated with {}",
            result.prompt_stage.used_model.as_deref().unwrap_or("unknown")
        );
        println!("{}", serde_json::to_string_pretty(structured)?);
    }

    if let Some(bytes) = result
        .image_stage
        .as_ref()
        .and_then(|stage| stage.image_bytes.as_ref())
    {
        fs::create_dir_all(&config.output_dir)?;
        let path = config.output_dir.join(format!(
            "visual-adapt-{}.png",
            chrono::Utc::now().timestamp_millis()
        ));
        fs::write(&path, bytes)?;
        log::info!("💾 Image saved to: {}", path.display());
    }

    match result.failure() {
        None => Ok(ExitCode::SUCCESS),
        Some(error) => {
            log::error!("❌ {}", error.summary);
            log::error!("Kind: {}", error.kind);
            log::error!("Detail: {}", error.detail);
            if error.kind == ErrorKind::NoImageProduced {
                log::warn!("💡 The request was probably filtered upstream; try a different instruction");
            }
            if let Some(raw) = &error.raw_payload {
                eprintln!("{}", raw);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
