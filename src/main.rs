use anyhow::{Context, Result};
use odds_edge::config::Config;
use odds_edge::engine::market::MarketState;
use odds_edge::feed::http_feed::HttpSlateFeed;
use odds_edge::feed::live_state::ScoreMemory;
use odds_edge::feed::types::Slate;
use odds_edge::feed::MatchFeed;
use odds_edge::report::{build_report_rows, evaluate_slate, render_table, MatchEvaluation};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "config.toml";

struct Args {
    config: PathBuf,
    watch: bool,
    json: bool,
    slate: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        config: PathBuf::from(DEFAULT_CONFIG),
        watch: false,
        json: false,
        slate: None,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--watch" => args.watch = true,
            "--json" => args.json = true,
            "--config" => {
                let path = it.next().context("--config needs a path")?;
                args.config = PathBuf::from(path);
            }
            flag if flag.starts_with("--") => anyhow::bail!("unknown flag: {}", flag),
            path => args.slate = Some(PathBuf::from(path)),
        }
    }
    if !args.watch && args.slate.is_none() {
        anyhow::bail!("usage: odds-edge [--config FILE] [--json] (<slate.json> | --watch)");
    }
    Ok(args)
}

/// Config file is optional; the built-in tables cover every sport.
fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        Config::load(path)
    } else {
        tracing::info!(path = %path.display(), "no config file, using built-in defaults");
        Ok(Config::default())
    }
}

fn print_evaluations(slate: &Slate, evaluations: &[MatchEvaluation], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(evaluations)?);
    } else {
        print!("{}", render_table(&build_report_rows(slate, evaluations)));
    }
    Ok(())
}

fn any_live(evaluations: &[MatchEvaluation]) -> bool {
    evaluations.iter().any(|e| e.market.total.state == MarketState::Live)
}

async fn watch(config: &Config, json: bool) -> Result<()> {
    let feed_config = config
        .feed
        .as_ref()
        .context("--watch needs a [feed] section in the config")?;
    let mut feed = HttpSlateFeed::new(feed_config)?;
    let mut scores = ScoreMemory::new();

    tracing::info!(url = %feed_config.url, "watching slate feed");
    loop {
        tokio::select! {
            result = feed.fetch_slate() => match result {
                Ok(Some(mut slate)) => {
                    scores.retain_slate(&slate);
                    scores.apply(&mut slate);
                    let evaluations = evaluate_slate(&slate, config);
                    feed.set_live_cadence(any_live(&evaluations));
                    if let Some(at) = feed.last_success() {
                        println!("-- {} --", at.format("%H:%M:%S"));
                    }
                    print_evaluations(&slate, &evaluations, json)?;
                }
                Ok(None) => tracing::debug!("slate unchanged"),
                Err(e) => tracing::warn!(error = %e, "slate fetch failed"),
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                return Ok(());
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("odds_edge=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    let config = load_config(&args.config)?;

    if args.watch {
        return watch(&config, args.json).await;
    }

    let Some(path) = args.slate else {
        return Ok(());
    };
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read slate file: {}", path.display()))?;
    let slate = Slate::from_json(&content)?;
    let evaluations = evaluate_slate(&slate, &config);
    print_evaluations(&slate, &evaluations, args.json)
}
