use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use clap::Subcommand;
use moodlens::config::AppConfig;
use moodlens::models::Post;
use moodlens::pipeline::{AnalysisRun, AnnotationPipeline, PipelineOptions};
use moodlens::report::render_markdown;
use moodlens::store::{MemoryStore, PostFilter};
use tracing::info;

#[derive(Parser)]
#[command(name = "moodlens")]
#[command(about = "Sentiment and mental-health-term analysis for social media posts")]
#[command(version)]
struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Path to a config file (defaults to config.toml / config.example.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate a JSON file of posts and print/write the annotation records
    Annotate {
        /// JSON file containing an array of posts
        input: PathBuf,
        /// Write records to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the full analysis (annotate, aggregate, correlate) over a JSON
    /// file of posts and render the Markdown report
    Analyze {
        /// JSON file containing an array of posts
        input: PathBuf,
        /// Write the Markdown report to this file instead of stdout
        #[arg(short, long)]
        report: Option<PathBuf>,
    },
    /// Show the effective configuration
    Config,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => Ok(AppConfig::from_file(path)?),
        None => match AppConfig::load() {
            Ok(config) => Ok(config),
            Err(moodlens::MoodLensError::Io(_)) => {
                // No config file is fine for CLI use; fall back to defaults
                Ok(AppConfig::default())
            }
            Err(other) => Err(other.into()),
        },
    }
}

fn read_posts(path: &PathBuf) -> anyhow::Result<Vec<Post>> {
    let content = std::fs::read_to_string(path)?;
    let posts: Vec<Post> = serde_json::from_str(&content)?;
    Ok(posts)
}

fn write_or_print(output: Option<&PathBuf>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)?;
            info!("Wrote {}", path.display());
        }
        None => println!("{content}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_ref())?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    moodlens::logging::init_logging_with_config(Some(&config))?;

    match cli.command {
        Commands::Annotate { input, output } => {
            let posts = read_posts(&input)?;
            let pipeline =
                AnnotationPipeline::with_default_dictionary(PipelineOptions::from_config(&config));
            let outcome = pipeline.annotate_chunked(&posts, config.batch_size()).await;
            info!(
                "Annotated {} of {} posts ({} failed)",
                outcome.stats.annotated, outcome.stats.total_posts, outcome.stats.failed
            );
            let json = serde_json::to_string_pretty(&outcome.records)?;
            write_or_print(output.as_ref(), &json)?;
        }
        Commands::Analyze { input, report } => {
            let posts = read_posts(&input)?;
            let store = Arc::new(MemoryStore::new());
            store.insert_posts(&posts).await;

            let run = AnalysisRun::new(store, &config);
            let output = run.execute(&PostFilter::default()).await?;

            let markdown = render_markdown(
                &output.report,
                &output.user_metrics,
                &output.term_summaries,
                &output.stats,
            );
            write_or_print(report.as_ref(), &markdown)?;
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
