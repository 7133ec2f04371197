//! docrepo command-line entry point.
//!
//! Fetches one document slug and writes the rendered HTML (or the redirect
//! target) to stdout. Logging goes to stderr so stdout carries only output.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use docrepo_client::{HandlerTable, Repository, RetrievalResult};
use docrepo_core::RepoConfig;
use tracing_subscriber::EnvFilter;

const EXIT_NOT_FOUND: u8 = 3;
const EXIT_ERROR: u8 = 4;

/// Render a document from a GitHub documentation repository.
#[derive(Parser, Debug)]
#[command(name = "docrepo", version, about)]
struct Args {
    /// Document slug, e.g. `getting-started` or `guide/install.md`
    slug: String,

    /// GitHub organization (overrides DOC_REPO_ORG)
    #[arg(long)]
    org: Option<String>,

    /// Repository name (overrides DOC_REPO_REPO)
    #[arg(long)]
    repo: Option<String>,

    /// Branch to read from (overrides DOC_REPO_BRANCH)
    #[arg(long)]
    branch: Option<String>,

    /// Emit JSON log lines on stderr
    #[arg(long)]
    json: bool,
}

impl Args {
    fn apply(&self, config: &mut RepoConfig) {
        if let Some(org) = &self.org {
            config.org = Some(org.clone());
        }
        if let Some(repo) = &self.repo {
            config.repo = Some(repo.clone());
        }
        if let Some(branch) = &self.branch {
            config.branch = branch.clone();
        }
    }
}

/// What the handler table produced for the requested slug.
#[derive(Debug)]
enum Outcome {
    Rendered(String),
    Redirected(String),
    NotFound(RetrievalResult),
    Failed(RetrievalResult),
}

impl Outcome {
    fn exit_code(&self) -> ExitCode {
        match self {
            Outcome::Rendered(_) | Outcome::Redirected(_) => ExitCode::SUCCESS,
            Outcome::NotFound(_) => ExitCode::from(EXIT_NOT_FOUND),
            Outcome::Failed(_) => ExitCode::from(EXIT_ERROR),
        }
    }
}

/// Layer `args` over `config` and check the result is usable.
fn resolve_config(args: &Args, mut config: RepoConfig) -> Result<RepoConfig> {
    args.apply(&mut config);
    config.validate()?;
    config.require_org()?;
    config.require_repo()?;
    Ok(config)
}

fn handlers<'a>() -> HandlerTable<'a, Outcome> {
    HandlerTable::new()
        .on_redirect(|redirect| Outcome::Redirected(redirect.url().to_string()))
        .on_complete(|doc| Outcome::Rendered(doc.to_html()))
        .on_not_found(Outcome::NotFound)
        .on_error(Outcome::Failed)
}

fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing(args.json);

    let config = RepoConfig::load().context("failed to load configuration")?;
    let config = resolve_config(&args, config)?;

    tracing::debug!(slug = %args.slug, branch = %config.branch, "requesting document");
    let repository = Repository::from_config(config).await?;
    let outcome = repository.request(&args.slug, handlers()).await?;

    match &outcome {
        Outcome::Rendered(html) => println!("{html}"),
        Outcome::Redirected(url) => println!("{url}"),
        Outcome::NotFound(result) | Outcome::Failed(result) => {
            eprintln!("{}: {result}", result.uri());
            if let Some(details) = result.details().filter(|d| !d.is_empty()) {
                eprintln!("{details}");
            }
        }
    }

    Ok(outcome.exit_code())
}
