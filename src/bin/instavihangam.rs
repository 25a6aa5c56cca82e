//! CLI for InstaVihangam - names and captions for your photos.

use clap::{Args, Parser, Subcommand};
use instavihangam::{
    CaptionFlow, GeminiModel, GeminiProvider, GenerationState, GenerativeModel, NameFlow,
    Orchestrator, PostPreview,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "instavihangam")]
#[command(about = "Generate a creative Indian name and an Instagram caption for an image")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a name and caption for an image
    Generate(GenerateArgs),

    /// Check that the API key and model are usable
    Check(ModelArgs),

    /// List available models
    Models,
}

#[derive(Args)]
struct ModelArgs {
    /// Gemini model identifier
    #[arg(short, long, default_value = "gemini-2.0-flash", value_parser = parse_model)]
    model: GeminiModel,

    /// API key (defaults to GOOGLE_API_KEY / GEMINI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,
}

#[derive(Args)]
struct GenerateArgs {
    /// Image file to describe
    image: PathBuf,

    #[command(flatten)]
    model: ModelArgs,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout: u64,
}

fn parse_model(id: &str) -> Result<GeminiModel, String> {
    GeminiModel::from_id(id).ok_or_else(|| {
        let known: Vec<_> = GeminiModel::ALL.iter().map(|m| m.as_str()).collect();
        format!("unknown model '{id}' (expected one of: {})", known.join(", "))
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => generate(args, cli.json).await,
        Commands::Check(args) => {
            check(args, cli.json).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Models => {
            list_models(cli.json)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn build_provider(args: &ModelArgs, timeout: Duration) -> anyhow::Result<GeminiProvider> {
    let mut builder = GeminiProvider::builder().model(args.model).timeout(timeout);
    if let Some(ref key) = args.api_key {
        builder = builder.api_key(key);
    }
    Ok(builder.build()?)
}

async fn generate(args: GenerateArgs, json_output: bool) -> anyhow::Result<ExitCode> {
    let timeout = Duration::from_secs(args.timeout);
    let model = Arc::new(build_provider(&args.model, timeout)?);
    let mut orchestrator =
        Orchestrator::new(NameFlow::new(model.clone()), CaptionFlow::new(model))
            .with_timeout(timeout);

    if let Err(e) = orchestrator.select_image(&args.image).await {
        anyhow::bail!("{} ({e})", e.user_message());
    }

    let progress = (!json_output).then(|| {
        let mut rx = orchestrator.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                match &*rx.borrow_and_update() {
                    GenerationState::InProgress { name: None } => {
                        eprintln!("Generating creative Indian name...")
                    }
                    GenerationState::InProgress { name: Some(name) } => {
                        eprintln!("Got \"{name}\", writing caption...")
                    }
                    _ => {}
                }
            }
        })
    });

    let state = orchestrator.generate().await?;
    let image = orchestrator.image().cloned();
    drop(orchestrator);
    if let Some(handle) = progress {
        handle.await?;
    }

    let preview = image.as_ref().and_then(|img| PostPreview::build(img, &state));

    if json_output {
        let result = serde_json::json!({
            "success": matches!(state, GenerationState::Succeeded { .. }),
            "image": args.image.display().to_string(),
            "state": state,
            "preview": preview,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        render(&state, preview.as_ref());
    }

    Ok(match state {
        GenerationState::Succeeded { .. } => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

fn render(state: &GenerationState, preview: Option<&PostPreview>) {
    if let Some(message) = state.error_message() {
        eprintln!("Error: {message}");
    }
    if let Some(name) = state.name() {
        println!("== Creative Indian Name ==\n{name}\n");
    }
    if let Some(caption) = state.caption() {
        println!("== Instagram Caption ==\n{caption}\n");
    }
    if let Some(preview) = preview {
        println!(
            "== Post Preview == [{} image, {} bytes]",
            preview.mime_type, preview.image_bytes
        );
        if let Some(ref title) = preview.title {
            println!("{title}");
        }
        if let Some(ref excerpt) = preview.caption_excerpt {
            println!("{excerpt}");
            if preview.truncated {
                println!("… more");
            }
        }
    }
}

async fn check(args: ModelArgs, json_output: bool) -> anyhow::Result<()> {
    let provider = build_provider(&args, Duration::from_secs(30))?;
    let result = provider.health_check().await;

    if json_output {
        let out = serde_json::json!({
            "provider": provider.kind().to_string(),
            "model": provider.model().as_str(),
            "ok": result.is_ok(),
            "error": result.as_ref().err().map(|e| e.user_message()),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        match &result {
            Ok(()) => println!("{} ({}) is reachable", provider.name(), provider.model()),
            Err(e) => println!("{} ({}): {}", provider.name(), provider.model(), e.user_message()),
        }
    }

    Ok(result?)
}

fn list_models(json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct ModelInfo {
        id: &'static str,
        provider: &'static str,
        default: bool,
        env_var: &'static str,
    }

    let models: Vec<ModelInfo> = GeminiModel::ALL
        .iter()
        .map(|m| ModelInfo {
            id: m.as_str(),
            provider: "gemini",
            default: *m == GeminiModel::default(),
            env_var: "GOOGLE_API_KEY",
        })
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&models)?);
    } else {
        println!("Available models:\n");
        for m in &models {
            let marker = if m.default { "*" } else { " " };
            println!("  {} {} ({})", marker, m.id, m.provider);
        }
        println!("\nAPI key: GOOGLE_API_KEY or GEMINI_API_KEY");
    }

    Ok(())
}
