use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail, ensure};
use clap::{Args, Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use headliner_client::fetcher::DEFAULT_MAX_BODY_BYTES;
use headliner_client::llm::DEFAULT_BASE_URL;
use headliner_client::{
    ExtractorConfig, MainContentExtractor, OpenAiTitleBackend, ReqwestFetcher, ReqwestTransport,
};
use headliner_core::{ContentService, FetchRequest, RetryPolicy, TitleRequest, TitleService};

#[derive(Parser)]
#[command(
    name = "headliner",
    version,
    about = "Generate headline candidates from a web page"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where `titles` reads its content from.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct TitleSource {
    /// Page URL to fetch
    #[arg(short, long)]
    url: Option<String>,

    /// Read the text from a file instead of fetching a page ("-" for stdin)
    #[arg(long, value_name = "PATH")]
    text_file: Option<PathBuf>,
}

/// Options shared by every command that fetches a page.
#[derive(Args)]
struct FetchArgs {
    /// Minimum extracted content length, in characters
    #[arg(long, env = "HEADLINER_MIN_LENGTH", default_value_t = 100)]
    min_length: usize,

    /// Per-attempt request timeout, in seconds
    #[arg(long, env = "HEADLINER_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Maximum number of attempts, including the first request
    #[arg(long, env = "HEADLINER_MAX_ATTEMPTS", default_value_t = 4)]
    max_attempts: u32,

    /// Delay before the first retry, in milliseconds
    #[arg(long, env = "HEADLINER_BACKOFF_MS", default_value_t = 1000)]
    backoff_ms: u64,

    /// Growth factor applied to the delay after each retry
    #[arg(long, env = "HEADLINER_BACKOFF_MULTIPLIER", default_value_t = 2.0)]
    backoff_multiplier: f64,

    /// Override the User-Agent header
    #[arg(long, env = "HEADLINER_USER_AGENT")]
    user_agent: Option<String>,

    /// Largest response body to read, in bytes
    #[arg(long, env = "HEADLINER_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    max_body_bytes: u64,

    /// Print a JSON report instead of plain text
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl FetchArgs {
    fn fetch_request(&self, url: &str) -> Result<FetchRequest> {
        let policy = RetryPolicy::new(self.max_attempts, Duration::from_millis(self.backoff_ms))
            .with_multiplier(self.backoff_multiplier);

        let mut builder = FetchRequest::builder(url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .retry_policy(policy);
        if let Some(agent) = &self.user_agent {
            builder = builder.header("User-Agent", agent);
        }

        builder.build().context("Invalid fetch options")
    }

    fn fetcher(&self) -> Result<ReqwestFetcher> {
        Ok(ReqwestTransport::new()
            .context("Failed to create HTTP client")?
            .with_max_body_bytes(self.max_body_bytes)
            .into_fetcher())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a page, extract its main content, and generate titles
    Titles {
        #[command(flatten)]
        source: TitleSource,

        #[command(flatten)]
        fetch: FetchArgs,

        /// Number of title candidates to request
        #[arg(short = 'n', long, env = "HEADLINER_COUNT", default_value_t = 5)]
        count: usize,

        /// Maximum characters of content sent to the model
        #[arg(long, env = "HEADLINER_MAX_INPUT_CHARS", default_value_t = 8000)]
        max_input_chars: usize,

        /// LLM model to use (e.g., "gpt-4o-mini", "llama-3.3-70b-versatile")
        #[arg(short, long, env = "HEADLINER_MODEL")]
        model: String,

        /// OpenAI-compatible API base URL
        #[arg(short, long, env = "HEADLINER_BASE_URL", default_value = DEFAULT_BASE_URL)]
        base_url: String,

        /// API key (reads from HEADLINER_API_KEY env var if not provided)
        #[arg(short, long, env = "HEADLINER_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Sampling temperature passed to the model
        #[arg(long, env = "HEADLINER_TEMPERATURE")]
        temperature: Option<f32>,
    },

    /// Fetch a page and print its extracted main content
    Extract {
        /// Page URL to fetch
        #[arg(short, long)]
        url: String,

        #[command(flatten)]
        fetch: FetchArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("headliner=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    tokio::select! {
        result = run(cli.command) => result,
        _ = tokio::signal::ctrl_c() => bail!("Interrupted"),
    }
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Titles {
            source,
            fetch,
            count,
            max_input_chars,
            model,
            base_url,
            api_key,
            temperature,
        } => {
            ensure!(count > 0, "--count must be at least 1");
            ensure!(max_input_chars > 0, "--max-input-chars must be at least 1");

            let mut backend = OpenAiTitleBackend::with_base_url(&api_key, &model, &base_url)
                .context("Failed to initialize title backend")?;
            if let Some(t) = temperature {
                backend = backend.with_temperature(t);
            }
            tracing::info!("Using model {}", backend.model());

            let service = TitleService::new(fetch.fetcher()?, extractor()?, backend);
            let report = match (&source.url, &source.text_file) {
                (_, Some(path)) => {
                    let text = read_text(path).await?;
                    service
                        .generate_from_text(&text, fetch.min_length, count, max_input_chars)
                        .await
                        .context("Failed to generate titles from text")?
                }
                (Some(url), None) => {
                    let request = TitleRequest {
                        fetch: fetch.fetch_request(url)?,
                        min_length: fetch.min_length,
                        max_candidates: count,
                        max_input_chars,
                    };
                    service
                        .generate(&request)
                        .await
                        .with_context(|| format!("Failed to generate titles for {url}"))?
                }
                (None, None) => bail!("Either --url or --text-file is required"),
            };

            if fetch.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for title in report.candidates.iter() {
                    println!("{title}");
                }
            }
            Ok(())
        }
        Commands::Extract { url, fetch } => {
            let request = fetch.fetch_request(&url)?;
            let service = ContentService::new(fetch.fetcher()?, extractor()?);

            let report = service
                .extract(&request, fetch.min_length)
                .await
                .with_context(|| format!("Failed to extract content from {url}"))?;

            if fetch.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.content.as_str());
            }
            Ok(())
        }
    }
}

fn extractor() -> Result<MainContentExtractor> {
    MainContentExtractor::new(ExtractorConfig::default())
        .context("Failed to build content extractor")
}

/// Read input text from a file, or from stdin when the path is "-".
async fn read_text(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read text from stdin")?;
        Ok(text)
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))
    }
}
