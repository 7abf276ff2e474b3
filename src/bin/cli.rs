// Book Splitter - Audiobook chapter splitting and tagging
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


use anyhow::{Context, Result};
use book_splitter::audio::AudioSource;
use book_splitter::crypto::ActivationBytes;
use book_splitter::{Pipeline, ProcessOptions, SplitterConfig, SplitterError, SystemRunner};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "book-splitter")]
#[command(about = "Split audiobooks into tagged chapter files", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true, env = "BOOK_SPLITTER_CONFIG")]
    config: Option<PathBuf>,

    /// Language model name, overrides the configuration
    #[arg(long, global = true, env = "BOOK_SPLITTER_MODEL")]
    model: Option<String>,

    /// Title cache file, overrides the configuration
    #[arg(long, global = true, env = "BOOK_SPLITTER_CACHE")]
    cache: Option<PathBuf>,

    /// Do not read or write the title cache
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a book into one file per chapter
    Split {
        /// Audiobook file (.aax, .m4b, .mp3, ...)
        input: PathBuf,
        /// Directory under which the book directory is created
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
        /// Activation bytes for AAX input (8 hex digits)
        #[arg(short, long, env = "AUDIBLE_ACTIVATION_BYTES")]
        activation_bytes: Option<String>,
        /// Use this title instead of asking the language model
        #[arg(short, long)]
        title: Option<String>,
        /// Keep long titles as they are
        #[arg(long)]
        no_shorten: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Decrypt an AAX file to .m4b next to it
    StripDrm {
        input: PathBuf,
        #[arg(short, long, env = "AUDIBLE_ACTIVATION_BYTES")]
        activation_bytes: String,
    },
    /// List the chapters that would be cut
    Chapters {
        input: PathBuf,
    },
    /// Reconcile the canonical title of a book
    Title {
        input: PathBuf,
    },
    /// Shorten a title with the language model
    Shorten {
        title: String,
    },
    /// Re-encode to mono and repackage as .m4a
    ExtractAudio {
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        match e.downcast_ref::<SplitterError>() {
            Some(splitter) => eprintln!("Error: {}", splitter.user_message()),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("book_splitter=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn load_config(cli: &Cli) -> Result<SplitterConfig> {
    let mut config = match &cli.config {
        Some(path) => SplitterConfig::load(path)
            .await
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SplitterConfig::default(),
    };

    if let Some(model) = &cli.model {
        config.llm_model = model.clone();
    }
    if let Some(cache) = &cli.cache {
        config.cache_path = Some(cache.clone());
    }
    if cli.no_cache {
        config.cache_path = None;
    }

    Ok(config)
}

fn parse_key(hex: &str) -> Result<ActivationBytes> {
    Ok(hex.parse::<ActivationBytes>()?)
}

fn source(path: &Path) -> Result<AudioSource> {
    Ok(AudioSource::from_path(path)?)
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli).await?;
    let mut pipeline = Pipeline::new(Arc::new(SystemRunner::new()), &config);

    match cli.command {
        Commands::Split {
            input,
            output,
            activation_bytes,
            title,
            no_shorten,
            json,
        } => {
            let options = ProcessOptions {
                output_root: output,
                activation_bytes: activation_bytes.as_deref().map(parse_key).transpose()?,
                title,
                shorten: !no_shorten,
            };

            let report = pipeline.process(&input, &options).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{} ({} chapters)", report.title, report.files.len());
                for file in &report.files {
                    println!("  {}", file.display());
                }
            }
        }
        Commands::StripDrm {
            input,
            activation_bytes,
        } => {
            let key = parse_key(&activation_bytes)?;
            let output = pipeline.drm().strip_drm(&source(&input)?, &key).await?;
            println!("{}", output.display());
        }
        Commands::Chapters { input } => {
            let chapters = pipeline.resolver().resolve_chapters(&source(&input)?).await?;
            for (i, chapter) in chapters.iter().enumerate() {
                println!(
                    "{:>3}  {:>10.3}s  {:>10.3}s  {}",
                    i + 1,
                    chapter.start_seconds(),
                    chapter.duration_seconds(),
                    chapter.title
                );
            }
        }
        Commands::Title { input } => {
            let source = source(&input)?;
            let metadata = pipeline.probe().probe(&source).await?;
            let title = pipeline.reconcile_title(&source, &metadata).await?;
            println!("{}", title);
        }
        Commands::Shorten { title } => {
            let short = pipeline.reconciler().shorten_title(&title).await?;
            println!("{}", short);
        }
        Commands::ExtractAudio { input } => {
            let output = pipeline.stream().extract_audio_stream(&source(&input)?).await?;
            println!("{}", output.display());
        }
    }

    Ok(())
}
