use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use futures::future::join_all;
use tokio::io::AsyncReadExt;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use link_card::{
    CacheManager, LinkCardOptions, LinkCardResult, LinkCardTransformer, Node, OutputMode,
};

/// Replace standalone URL paragraphs in mdast JSON documents with link cards.
#[derive(Parser, Debug)]
#[command(name = "link-card", version)]
struct Cli {
    /// mdast JSON documents to transform. Reads one document from stdin when
    /// no files are given.
    files: Vec<PathBuf>,

    /// Rewrite the input files instead of printing to stdout.
    #[arg(long, requires = "files")]
    in_place: bool,

    /// JSON file with transformer options (camelCase keys). Without it,
    /// options come from LINK_CARD_* environment variables.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the cache file location.
    #[arg(long)]
    cache_path: Option<PathBuf>,

    /// Output shape: false (full card), true (data attributes) or marker.
    #[arg(long, value_parser = parse_mode)]
    headless: Option<OutputMode>,

    /// Leave paragraphs untouched when their URL cannot be fetched.
    #[arg(long)]
    no_fallback: bool,
}

fn parse_mode(value: &str) -> Result<OutputMode, String> {
    OutputMode::parse(value).ok_or_else(|| format!("expected false, true or marker, got {value:?}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so stdout stays valid JSON.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("link_card=info"));

    if std::env::var("APP_ENV").as_deref() == Ok("production") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "link-card failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> LinkCardResult<()> {
    let mut options: LinkCardOptions = match &cli.config {
        Some(path) => serde_json::from_str(&tokio::fs::read_to_string(path).await?)?,
        None => LinkCardOptions::from_env(),
    };
    if let Some(cache_path) = cli.cache_path {
        options.cache_path = cache_path;
    }
    if let Some(mode) = cli.headless {
        options.mode = mode;
    }
    if cli.no_fallback {
        options.fallback_on_error = false;
    }
    info!(cache_path = %options.cache_path.display(), "Link card options loaded");

    let cache = CacheManager::new();
    let transformer = LinkCardTransformer::new(options, cache.clone())?;

    let result = if cli.files.is_empty() {
        transform_stdin(&transformer).await
    } else {
        let outcomes = join_all(
            cli.files
                .iter()
                .map(|path| transform_file(&transformer, path, cli.in_place)),
        )
        .await;
        outcomes.into_iter().collect()
    };

    cache.flush().await;
    result
}

async fn transform_stdin(transformer: &LinkCardTransformer) -> LinkCardResult<()> {
    let mut input = String::new();
    tokio::io::stdin().read_to_string(&mut input).await?;
    let mut tree: Node = serde_json::from_str(&input)?;
    transformer.transform(&mut tree).await;
    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(())
}

async fn transform_file(
    transformer: &LinkCardTransformer,
    path: &Path,
    in_place: bool,
) -> LinkCardResult<()> {
    let mut tree: Node = serde_json::from_str(&tokio::fs::read_to_string(path).await?)?;
    transformer.transform(&mut tree).await;
    let output = serde_json::to_string_pretty(&tree)?;

    if in_place {
        tokio::fs::write(path, output).await?;
        info!(path = %path.display(), "Document rewritten");
    } else {
        println!("{output}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let cli = Cli::parse_from([
            "link-card",
            "--headless",
            "marker",
            "--no-fallback",
            "--cache-path",
            "/tmp/cards.json",
            "post.json",
        ]);
        assert_eq!(cli.headless, Some(OutputMode::Marker));
        assert!(cli.no_fallback);
        assert_eq!(cli.cache_path, Some(PathBuf::from("/tmp/cards.json")));
        assert_eq!(cli.files, vec![PathBuf::from("post.json")]);
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["link-card", "--headless", "sometimes"]).is_err());
    }

    #[test]
    fn in_place_requires_files() {
        assert!(Cli::try_parse_from(["link-card", "--in-place"]).is_err());
    }
}
