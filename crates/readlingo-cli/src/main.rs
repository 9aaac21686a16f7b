//! Readlingo CLI - translate words and passages with a local translation cache.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use readlingo_core::{
    AppConfig, CacheEntry, Lang, TranslationResult, TranslationService, create_translator,
};
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "readlingo")]
#[command(author, version, about = "Translate text through a cached, rate-limited Youdao client", long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Source language code
    #[arg(short = 's', long, global = true)]
    source: Option<String>,

    /// Target language code
    #[arg(short = 't', long, global = true)]
    target: Option<String>,

    /// Youdao application key
    #[arg(long, env = "YOUDAO_APP_KEY", global = true, hide_env_values = true)]
    app_key: Option<String>,

    /// Youdao application secret
    #[arg(long, env = "YOUDAO_APP_SECRET", global = true, hide_env_values = true)]
    app_secret: Option<String>,

    /// Keep the cache in memory only
    #[arg(long, global = true)]
    no_disk_cache: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate a single text
    Translate {
        /// Text to translate
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Translate one text per line from a file ("-" for stdin), printing JSON lines
    Batch { input: PathBuf },
    /// Save Youdao credentials to the credential file
    Configure {
        #[arg(long)]
        key: String,
        #[arg(long)]
        secret: String,
    },
    /// Show cache statistics
    Stats,
    /// Remove expired cache entries
    Clean,
    /// Remove every cache entry
    Clear,
    /// Load `[["text", {"translation": ...}], ...]` pairs into the cache
    Preload { file: PathBuf },
    /// Dump every cache entry as JSON
    Export,
}

fn read_lines(input: &PathBuf) -> Result<Vec<String>> {
    let reader: Box<dyn BufRead> = if input.as_os_str() == "-" {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        let file = std::fs::File::open(input)
            .context(format!("Failed to open {}", input.display()))?;
        Box::new(BufReader::new(file))
    };

    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line.context("Failed to read input")?;
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }
    Ok(lines)
}

// CLI output is intentional
#[allow(clippy::print_stdout)]
fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_result(result: &TranslationResult) {
    println!("{}", result.translation);
    if let Some(ref phonetic) = result.phonetic {
        println!("  [{phonetic}]");
    }
    for explain in &result.explains {
        println!("  {explain}");
    }
    for example in &result.examples {
        println!("  - {example}");
    }
}

fn open_service(config: &AppConfig) -> Result<TranslationService> {
    TranslationService::from_config(config).context("Failed to initialize translation service")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };

    // Override config with CLI arguments
    if let Some(source) = &args.source {
        config.source_lang = Lang::new(source);
    }
    if let Some(target) = &args.target {
        config.target_lang = Lang::new(target);
    }
    if args.app_key.is_some() && args.app_secret.is_some() {
        config.provider.app_key.clone_from(&args.app_key);
        config.provider.app_secret.clone_from(&args.app_secret);
    }
    if args.no_disk_cache {
        config.cache.disk_enabled = false;
    }

    match args.command {
        Command::Configure { key, secret } => {
            // Always write to the credential file, even if config carries a key pair
            config.provider.app_key = None;
            config.provider.app_secret = None;
            let translator = create_translator(&config).context("Failed to create translator")?;
            translator
                .set_credentials(key, secret)
                .await
                .context("Failed to save credentials")?;
            info!("Saved credentials to {}", config.credentials_path().display());
        }
        Command::Translate { text } => {
            let service = open_service(&config)?;
            let text = text.join(" ");
            if !service.is_configured().await {
                anyhow::bail!(
                    "{} credentials are not configured; run `readlingo configure` or set YOUDAO_APP_KEY/YOUDAO_APP_SECRET",
                    service.adapter_name()
                );
            }
            let result = service
                .translate(&text)
                .await
                .map_err(|e| anyhow::anyhow!("{} ({})", e, e.kind()))?;
            print_result(&result);
        }
        Command::Batch { input } => {
            let service = open_service(&config)?;
            let texts = read_lines(&input)?;

            #[allow(clippy::cast_possible_truncation)]
            let pb = ProgressBar::new(texts.len() as u64);
            // Template is hardcoded and valid, unwrap is safe
            #[allow(clippy::unwrap_used)]
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                    .unwrap()
                    .progress_chars("#>-"),
            );

            // Failed lines keep their slot and carry the error kind instead of a result
            let mut lines = Vec::with_capacity(texts.len());
            for text in &texts {
                let line = match service.translate(text).await {
                    Ok(result) => serde_json::json!({ "text": text, "result": result }),
                    Err(e) => {
                        warn!("Failed to translate '{}': {}", text, e);
                        serde_json::json!({
                            "text": text,
                            "result": TranslationResult::empty(),
                            "error": e.kind().as_str(),
                        })
                    }
                };
                lines.push(line);
                pb.inc(1);
            }
            pb.finish_and_clear();

            #[allow(clippy::print_stdout)]
            for line in &lines {
                println!("{line}");
            }
        }
        Command::Stats => {
            let service = open_service(&config)?;
            let stats = service.cache_stats().await;
            print_json(&stats)?;
        }
        Command::Clean => {
            let service = open_service(&config)?;
            let removed = service
                .clean_expired_cache()
                .await
                .context("Failed to clean cache")?;
            #[allow(clippy::print_stdout)]
            {
                println!("Removed {removed} expired entries");
            }
        }
        Command::Clear => {
            let service = open_service(&config)?;
            service.clear_cache().await.context("Failed to clear cache")?;
            #[allow(clippy::print_stdout)]
            {
                println!("Translation cache cleared");
            }
        }
        Command::Preload { file } => {
            let service = open_service(&config)?;
            let content = std::fs::read_to_string(&file)
                .context(format!("Failed to read {}", file.display()))?;
            let entries: Vec<(String, TranslationResult)> =
                serde_json::from_str(&content).context("Failed to parse preload file")?;
            let count = service
                .preload_cache(entries)
                .await
                .context("Failed to preload cache")?;
            #[allow(clippy::print_stdout)]
            {
                println!("Preloaded {count} entries");
            }
        }
        Command::Export => {
            let service = open_service(&config)?;
            let entries: Vec<CacheEntry> = service
                .cache()
                .entries()
                .await
                .context("Failed to read cache")?;
            print_json(&entries)?;
        }
    }

    Ok(())
}
