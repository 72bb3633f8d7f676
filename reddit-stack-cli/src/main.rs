use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use reddit_stack_lib::{
    categorize, count, extract_from_comments, parse_thread_id, CategoryTally, CredentialError,
    Credentials, MarkerPattern, RawComment, RedditClient, RunContext, TokenCount,
    DEFAULT_QUESTION, DEFAULT_USER_AGENT,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reddit-stack")]
#[command(about = "Report the technologies respondents list in a Reddit questionnaire thread")]
struct Args {
    /// Your Reddit username
    #[arg(long, env = "REDDIT_USERNAME")]
    username: Option<String>,

    /// Your Reddit password
    #[arg(long, env = "REDDIT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Your Reddit API client ID
    #[arg(long, alias = "client_id", env = "REDDIT_CLIENT_ID")]
    client_id: Option<String>,

    /// Your Reddit API client secret/key
    #[arg(long, alias = "client_key", env = "REDDIT_CLIENT_KEY", hide_env_values = true)]
    client_key: Option<String>,

    /// User agent for Reddit API requests
    #[arg(long, alias = "user_agent", env = "REDDIT_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Thread id or URL (e.g., https://www.reddit.com/r/dataengineering/comments/abc123/)
    #[arg(long, alias = "thread_id", env = "REDDIT_THREAD_ID")]
    thread_id: Option<String>,

    /// JSON file with the non-technology words to drop ({ "words": [...] })
    #[arg(long, default_value = "data/non_tech_words.json")]
    stop_words: PathBuf,

    /// JSON file mapping categories to technology names
    #[arg(long)]
    taxonomy: Option<PathBuf>,

    /// Questionnaire number of the tech-stack question
    #[arg(long, default_value_t = DEFAULT_QUESTION)]
    question: u32,

    /// Number of ranked technologies to show
    #[arg(long, default_value_t = 25)]
    top: usize,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show debug output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    thread_id: String,
    comments: usize,
    stack_lines: Vec<String>,
    tokens: Vec<String>,
    counts: Vec<TokenCount>,
    categories: Vec<CategoryTally>,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Fetch every comment of the thread with a spinner on stderr.
async fn fetch_with_progress(client: &RedditClient, thread_id: &str) -> Result<Vec<RawComment>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} ({elapsed})")
            .context("Invalid progress template")?,
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message("Fetching comments...");

    let comments = client
        .fetch_comments_with_progress(thread_id, |fetched, pending| {
            pb.set_message(format!(
                "Fetched {} comments, {} placeholders left",
                fetched, pending
            ));
        })
        .await;

    match &comments {
        Ok(comments) => pb.finish_with_message(format!("Fetched {} comments", comments.len())),
        Err(_) => pb.abandon_with_message("Fetching comments failed"),
    }

    comments
}

fn render_text(report: &Report, top: usize) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Thread {}: {} comments, {} stack lines, {} tokens\n\n",
        report.thread_id,
        report.comments,
        report.stack_lines.len(),
        report.tokens.len()
    ));
    out.push_str(&format!("[{}]\n", report.tokens.join(", ")));

    if !report.counts.is_empty() {
        out.push_str(&format!("\nTop {}:\n", top.min(report.counts.len())));
        for entry in report.counts.iter().take(top) {
            out.push_str(&format!("{:>6}  {}\n", entry.count, entry.token));
        }
    }

    for tally in &report.categories {
        let names: Vec<String> = tally
            .tokens
            .iter()
            .map(|t| format!("{} ({})", t.token, t.count))
            .collect();
        out.push_str(&format!(
            "\n{} [{}]: {}\n",
            tally.category,
            tally.total,
            names.join(", ")
        ));
    }

    out
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    let credentials = match Credentials::from_parts(
        args.username,
        args.password,
        args.client_id,
        args.client_key,
        Some(args.user_agent),
    ) {
        Ok(credentials) => credentials,
        Err(e) => {
            warn!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let Some(thread_input) = args.thread_id.filter(|t| !t.trim().is_empty()) else {
        warn!("{}", CredentialError::MissingThread);
        return Ok(ExitCode::FAILURE);
    };
    let thread_id = parse_thread_id(&thread_input)?;

    let ctx = RunContext::load(&args.stop_words, args.taxonomy.as_deref())?
        .with_marker(MarkerPattern::new(args.question));
    info!(
        "Loaded {} stop words{}",
        ctx.stop_words.len(),
        ctx.taxonomy
            .as_ref()
            .map(|t| format!(" and {} known technologies", t.len()))
            .unwrap_or_default()
    );

    let client = RedditClient::login(&credentials).await?;
    let user = client.me().await?;
    info!("Successfully connected as user = {}", user);

    let comments = fetch_with_progress(&client, &thread_id).await?;
    let extraction = extract_from_comments(&ctx, &comments);
    let counts = count(&extraction.tokens);

    let report = Report {
        thread_id,
        comments: comments.len(),
        categories: ctx
            .taxonomy
            .as_ref()
            .map(|taxonomy| categorize(&counts, taxonomy))
            .unwrap_or_default(),
        counts: counts.ranked(),
        stack_lines: extraction.lines,
        tokens: extraction.tokens,
    };

    let rendered = if args.json {
        serde_json::to_string_pretty(&report)?
    } else {
        render_text(&report, args.top)
    };

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, rendered)
                .await
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            eprintln!("Saved: {}", path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(ExitCode::SUCCESS)
}
