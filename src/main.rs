use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span};
use tracing_subscriber::EnvFilter;

use pr_digest::{config, digest, feed, markdown, prompt, report};

/// PR Digest: turns a daily Markdown digest of merged Pull Requests into an
/// RSS feed and a label index, and builds the prompts used to write it.
#[derive(Parser, Debug)]
#[command(name = "pr-digest", version, about)]
struct Cli {
    /// Config file (defaults to .pr-digest.toml in the current directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the RSS feed for one digest
    Feed {
        /// Digest date key (e.g. 2025/01/15)
        date_key: String,

        /// Markdown digest to read instead of <content_dir>/<date_key>.md
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Write the feed here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the label index of one digest
    Labels {
        /// Digest date key (e.g. 2025/01/15)
        date_key: String,

        /// Markdown digest to read instead of <content_dir>/<date_key>.md
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Write a markdown report here instead of printing to the terminal
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the summarization prompt for a pull request
    Prompt {
        /// JSON document with pull_request, files, reviews and issue_comments
        #[arg(required_unless_present = "system")]
        pr_json: Option<PathBuf>,

        /// Print the system prompt instead
        #[arg(long)]
        system: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let config = match cli.config.as_deref() {
        Some(path) => config::Config::load_from(path)?.with_env_overrides(),
        None => config::Config::load()?,
    };
    debug!(base_url = %config.site.base_url, repository = %config.repository.full_name(), "configuration loaded");

    match cli.command {
        Command::Feed {
            date_key,
            input,
            output,
        } => {
            let _span = info_span!("feed", date_key = %date_key).entered();
            let text = read_digest(&config, &date_key, input.as_deref()).await?;

            info!("rendering feed");
            let rss = feed::render(&date_key, &text, &config, chrono::Utc::now())?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, rss).await?;
                    info!(path = %path.display(), "feed written");
                }
                None => print!("{}", rss),
            }
        }
        Command::Labels {
            date_key,
            input,
            output,
        } => {
            let _span = info_span!("labels", date_key = %date_key).entered();
            let text = read_digest(&config, &date_key, input.as_deref()).await?;

            info!("analyzing digest");
            let analysis = digest::analyze(&markdown::parse(&text))?;
            info!(
                total = analysis.total_count(),
                bots = analysis.bot_count(),
                labels = analysis.label_count(),
                "analysis complete"
            );

            let built_report = report::build(&analysis, &date_key, &config.site);
            report::output(&built_report, output.as_deref())?;
        }
        Command::Prompt { pr_json, system } => {
            if system {
                print!("{}", prompt::SYSTEM_PROMPT);
                return Ok(());
            }

            let pr_json = pr_json.ok_or("PR JSON path is required unless --system is used")?;
            let _span = info_span!("prompt", path = %pr_json.display()).entered();
            let info = prompt::load_info(&pr_json).await?;
            let text = prompt::build_prompt(&info, &config.prompt, &config.repository.full_name());
            print!("{}", text);
        }
    }

    info!("done");
    Ok(())
}

/// Read a digest from `input`, or from the content directory by date key.
async fn read_digest(
    config: &config::Config,
    date_key: &str,
    input: Option<&Path>,
) -> Result<String, Box<dyn std::error::Error>> {
    let path = match input {
        Some(path) => path.to_path_buf(),
        None => config.site.digest_path(date_key),
    };
    debug!(path = %path.display(), "reading digest");
    let text = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| format!("Failed to read digest {}: {}", path.display(), e))?;
    Ok(text)
}
