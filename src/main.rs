//! gitgloss - AI explanations for GitHub pages
//!
//! Main entry point for the gitgloss CLI.

use clap::{Parser, Subcommand};
use gitgloss::config::GitGlossConfig;
use gitgloss::page::{PageContext, PageType};
use gitgloss::resolver::{Purpose, Resource};
use gitgloss::session::Session;
use gitgloss::{prompt, GitGlossError};
use std::path::PathBuf;
use std::process;

/// gitgloss - Explain GitHub repositories and files with AI
#[derive(Parser, Debug)]
#[command(name = "gitgloss")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/gitgloss/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a default configuration file
    Init,

    /// Store credentials (generation API key, optional GitHub token)
    Login {
        /// Generation backend API key
        #[arg(long)]
        token: String,

        /// GitHub token for higher-quota repository reads
        #[arg(long)]
        github_token: Option<String>,
    },

    /// Resolve a resource and print its content
    Resolve {
        /// GitHub page URL
        url: String,

        /// What to resolve (file, readme, tree, languages, repo)
        #[arg(short, long, default_value = "file")]
        purpose: String,

        /// Captured page HTML to try before the API
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Generate a project overview
    Overview {
        /// GitHub repository or page URL
        url: String,

        /// Captured page HTML to try before the API
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Generate a structure analysis of a repository
    Structure {
        /// GitHub repository or page URL
        url: String,

        /// Captured page HTML to try before the API
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Generate an explanation of a file
    Explain {
        /// GitHub file URL (`.../blob/<branch>/<path>`)
        url: String,

        /// Captured page HTML to try before the API
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = gitgloss::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> gitgloss::Result<()> {
    match cli.command {
        Commands::Init => handle_init(&cli.config),
        Commands::Login {
            token,
            github_token,
        } => handle_login(&cli.config, token, github_token),
        Commands::Resolve {
            url,
            purpose,
            snapshot,
        } => handle_resolve(&cli.config, &url, &purpose, snapshot).await,
        Commands::Overview { url, snapshot } => handle_overview(&cli.config, &url, snapshot).await,
        Commands::Structure { url, snapshot } => {
            handle_structure(&cli.config, &url, snapshot).await
        }
        Commands::Explain { url, snapshot } => handle_explain(&cli.config, &url, snapshot).await,
    }
}

fn load_config(path: &Option<PathBuf>) -> gitgloss::Result<GitGlossConfig> {
    match path {
        Some(path) => GitGlossConfig::load(path),
        None => match GitGlossConfig::load_default() {
            Ok(config) => Ok(config),
            // A missing config is fine for read-only use; generation will
            // fail fast with its own setup prompt
            Err(GitGlossError::Config(_)) => Ok(GitGlossConfig::default()),
            Err(e) => Err(e),
        },
    }
}

fn save_config(config: &GitGlossConfig, path: &Option<PathBuf>) -> gitgloss::Result<()> {
    match path {
        Some(path) => config.save(path),
        None => config.save_default(),
    }
}

fn handle_init(path: &Option<PathBuf>) -> gitgloss::Result<()> {
    let config = GitGlossConfig::default();
    save_config(&config, path)?;

    let shown = path
        .clone()
        .unwrap_or_else(GitGlossConfig::default_path);
    println!("Created {}", shown.display());
    println!("Next: gitgloss login --token <KEY>");
    Ok(())
}

fn handle_login(
    path: &Option<PathBuf>,
    token: String,
    github_token: Option<String>,
) -> gitgloss::Result<()> {
    let mut config = load_config(path)?;
    config.set_api_key(token);
    if let Some(github_token) = github_token {
        config.set_github_token(github_token);
    }
    save_config(&config, path)?;

    println!("Credentials saved.");
    Ok(())
}

fn read_snapshot(path: Option<PathBuf>) -> gitgloss::Result<Option<String>> {
    path.map(std::fs::read_to_string)
        .transpose()
        .map_err(Into::into)
}

fn parse_purpose(s: &str) -> gitgloss::Result<Purpose> {
    match s {
        "file" => Ok(Purpose::FileContent),
        "readme" => Ok(Purpose::Readme),
        "tree" => Ok(Purpose::Tree),
        "languages" => Ok(Purpose::Languages),
        "repo" => Ok(Purpose::RepoInfo),
        other => Err(GitGlossError::Config(format!(
            "Unknown purpose '{}' (expected file, readme, tree, languages or repo)",
            other
        ))),
    }
}

async fn handle_resolve(
    config_path: &Option<PathBuf>,
    url: &str,
    purpose: &str,
    snapshot: Option<PathBuf>,
) -> gitgloss::Result<()> {
    let config = load_config(config_path)?;
    let ctx = PageContext::parse(url)?;
    let purpose = parse_purpose(purpose)?;

    let session = Session::with_snapshot(config, read_snapshot(snapshot)?)?;
    let resource = Resource::from_page(&ctx, purpose);

    match session.resolve(&resource).await? {
        Some(content) => println!("{}", content),
        None => eprintln!("No content found for {}", resource.cache_key()),
    }
    Ok(())
}

async fn handle_overview(
    config_path: &Option<PathBuf>,
    url: &str,
    snapshot: Option<PathBuf>,
) -> gitgloss::Result<()> {
    let config = load_config(config_path)?;
    let ctx = PageContext::parse(url)?;

    let session = Session::with_snapshot(config, read_snapshot(snapshot)?)?;
    require_credential(&session)?;

    let project = session.collect_project_data(&ctx).await;
    let prompt = prompt::overview(&project);

    let resource = Resource::new(Purpose::Overview, &ctx.owner, &ctx.repo, &ctx.branch);
    let text = session.analyze(&resource, &prompt).await?;
    println!("{}", text);
    Ok(())
}

async fn handle_structure(
    config_path: &Option<PathBuf>,
    url: &str,
    snapshot: Option<PathBuf>,
) -> gitgloss::Result<()> {
    let config = load_config(config_path)?;
    let ctx = PageContext::parse(url)?;

    let session = Session::with_snapshot(config, read_snapshot(snapshot)?)?;
    require_credential(&session)?;

    let project = session.collect_project_data(&ctx).await;
    let prompt = prompt::structure(&project);

    let resource = Resource::new(Purpose::Structure, &ctx.owner, &ctx.repo, &ctx.branch);
    let text = session.analyze(&resource, &prompt).await?;
    println!("{}", text);
    Ok(())
}

async fn handle_explain(
    config_path: &Option<PathBuf>,
    url: &str,
    snapshot: Option<PathBuf>,
) -> gitgloss::Result<()> {
    let config = load_config(config_path)?;
    let ctx = PageContext::parse(url)?;

    if ctx.page_type != PageType::File || ctx.file_path.is_none() {
        return Err(GitGlossError::Config(format!(
            "Not a file URL: {} (expected .../blob/<branch>/<path>)",
            url
        )));
    }

    let session = Session::with_snapshot(config, read_snapshot(snapshot)?)?;
    require_credential(&session)?;

    let file_resource = Resource::from_page(&ctx, Purpose::FileContent);
    let Some(content) = session.resolve(&file_resource).await? else {
        return Err(GitGlossError::Other(format!(
            "Could not acquire content for {} from any source",
            file_resource.cache_key()
        )));
    };

    let project = session.collect_project_data(&ctx).await;
    let file_path = ctx.file_path.as_deref().unwrap_or_default();
    let prompt = prompt::explain_file(&project, file_path, &content);

    let resource = Resource::from_page(&ctx, Purpose::Detail);
    let text = session.analyze(&resource, &prompt).await?;
    println!("{}", text);
    Ok(())
}

fn require_credential(session: &Session) -> gitgloss::Result<()> {
    if !session.is_generation_configured() {
        return Err(GitGlossError::MissingCredential);
    }
    Ok(())
}
