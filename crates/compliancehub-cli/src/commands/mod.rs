//! Subcommand handlers. Each takes the shared [`Context`] and prints its
//! result as text or JSON.

mod account;
mod compliance;
mod controls;
mod evidence;
mod library;
mod organization;

use anyhow::Context as _;
use compliancehub_client::{ApiClient, ClientConfig, FileSessionStore};
use compliancehub_core::CompanyId;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::cli::{Cli, Commands};

pub struct Context {
    pub client: ApiClient,
    pub json: bool,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let config = ClientConfig::load(cli.config.as_deref())
            .context("failed to load client configuration")?;
        let session_file = cli.session_file.clone().unwrap_or_else(default_session_file);
        debug!(session_file = %session_file.display(), "Using session file");

        let mut builder = ApiClient::builder()
            .config(config)
            .store(Arc::new(FileSessionStore::new(session_file)))
            .on_session_expired(|| debug!("Stored session cleared after failed refresh"));
        if let Some(url) = &cli.base_url {
            builder = builder.base_url(url.clone());
        }
        if let Some(company) = &cli.company {
            builder = builder.company(CompanyId::new(company.clone()));
        }

        Ok(Self {
            client: builder.build()?,
            json: cli.json,
        })
    }
}

/// `$HOME/.compliancehub/session.json`, or relative to the working
/// directory when `HOME` is unset.
pub fn default_session_file() -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_default();
    home.join(".compliancehub").join("session.json")
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::from_cli(&cli)?;
    match cli.command {
        Commands::Login { email, password } => account::login(&ctx, &email, password).await,
        Commands::Logout => account::logout(&ctx).await,
        Commands::Whoami => account::whoami(&ctx).await,
        Commands::Register(args) => account::register(&ctx, args).await,
        Commands::Profile { command } => account::profile(&ctx, command).await,
        Commands::Password { command } => account::password(&ctx, command).await,
        Commands::Company { command } => organization::company(&ctx, command).await,
        Commands::Team { command } => organization::team(&ctx, command).await,
        Commands::Departments { command } => organization::departments(&ctx, command).await,
        Commands::Frameworks { command } => library::frameworks(&ctx, command).await,
        Commands::Controls { command } => controls::controls(&ctx, command).await,
        Commands::Evidence { command } => evidence::evidence(&ctx, command).await,
        Commands::Compliance { command } => compliance::compliance(&ctx, command).await,
        Commands::Dashboard => compliance::dashboard(&ctx).await,
    }
}

/// Read one line from stdin after printing `prompt` to stderr. Input is
/// echoed.
pub(crate) fn prompt_line(prompt: &str) -> anyhow::Result<String> {
    eprint!("{}", prompt);
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
