//! # Roster CLI
//!
//! `roster` fetches a user directory, filters it by a sanitized search query
//! and deletes users optimistically.
//!
//! ```text
//! roster list --search ervin
//! roster delete 3 --yes --json
//! printf '{"action":"type","text":"Jo"}\n' | roster session
//! ```
//!
//! Logs go to stderr; stdout carries only the table or JSON frames.

pub mod render;
pub mod session;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use dialoguer::Confirm;
use log::info;
use roster_model::{User, UserId};
use roster_store::StoreHandle;
use roster_sync::{HttpUserApi, InMemoryUserApi, RosterConfig, UserApi, UserSync};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::render::Frame;
use crate::session::Session;

#[derive(Parser, Debug)]
#[command(name = "roster")]
#[command(about = "Search and prune a remote user directory", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Base URL of the user API (overrides the config file and ROSTER_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Search debounce quiet period in milliseconds
    #[arg(long, global = true)]
    pub debounce_ms: Option<u64>,

    /// Serve users from a JSON file instead of the API
    #[arg(long, global = true)]
    pub fixture: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch users and print the (optionally filtered) table
    List(ListArgs),

    /// Delete one user and print what remains
    Delete(DeleteArgs),

    /// Drive a session with JSON-lines actions on stdin
    Session,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by name or email
    #[arg(short, long)]
    pub search: Option<String>,

    /// Print a JSON frame instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub id: UserId,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Print a JSON frame instead of a table
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Whether stdout is reserved for JSON.
    pub const fn json_output(&self) -> bool {
        match &self.command {
            Commands::List(args) => args.json,
            Commands::Delete(args) => args.json,
            Commands::Session => true,
        }
    }

    /// Defaults, config file, environment, then flags.
    pub fn resolve_config(&self) -> Result<RosterConfig> {
        let mut config = RosterConfig::load(self.config.as_deref())?;
        if let Some(url) = &self.api_url {
            config.api_base_url.clone_from(url);
        }
        if let Some(ms) = self.debounce_ms {
            config.debounce = Duration::from_millis(ms);
        }
        config.validate()?;
        Ok(config)
    }
}

pub async fn main_entry() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = cli.resolve_config()?;
    let api = build_api(&cli, &config)?;
    let sync = UserSync::new(api, StoreHandle::default(), &config);

    let result = match &cli.command {
        Commands::List(args) => run_list(&sync, args).await,
        Commands::Delete(args) => run_delete(&sync, args).await,
        Commands::Session => {
            let session = Session::new(sync.clone(), config.debounce);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            session.run(stdin, &mut std::io::stdout()).await
        }
    };
    sync.teardown();
    result
}

fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet || (cli.json_output() && !cli.verbose) {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn build_api(cli: &Cli, config: &RosterConfig) -> Result<Arc<dyn UserApi>> {
    if let Some(path) = &cli.fixture {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        let users: Vec<User> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse fixture {}", path.display()))?;
        info!("serving {} users from {}", users.len(), path.display());
        return Ok(Arc::new(InMemoryUserApi::new(users)));
    }
    Ok(Arc::new(HttpUserApi::new(config)?))
}

async fn run_list(sync: &UserSync, args: &ListArgs) -> Result<()> {
    sync.users().await.context("Failed to load users")?;
    if let Some(query) = &args.search {
        sync.store().set_search_query(query);
    }
    print_frame(&Frame::capture(sync.store()), args.json)
}

async fn run_delete(sync: &UserSync, args: &DeleteArgs) -> Result<()> {
    let users = sync.users().await.context("Failed to load users")?;
    let Some(user) = users.iter().find(|user| user.id == args.id) else {
        bail!("User {} not found", args.id);
    };

    if !args.yes && !confirm_delete(&user.name)? {
        info!("delete of {} cancelled", user.name);
        return Ok(());
    }

    match sync.delete(args.id).await {
        Ok(()) => print_frame(&Frame::capture(sync.store()), args.json),
        Err(err) => {
            let frame = Frame::capture(sync.store()).with_error(&err);
            print_frame(&frame, args.json)?;
            Err(err).context("Delete failed")
        }
    }
}

fn confirm_delete(name: &str) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(format!(
            "This will permanently delete {name} from the user list. Delete?"
        ))
        .default(false)
        .interact()?;
    Ok(confirmed)
}

fn print_frame(frame: &Frame, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(frame)?);
    } else {
        print!("{}", render::table(frame));
    }
    Ok(())
}
