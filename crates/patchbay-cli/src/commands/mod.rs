//! Command dispatch: bridges CLI args to inventory operations and
//! output formatting.

pub mod auth;
pub mod providers;
pub mod sites;

use std::sync::Arc;
use std::time::Duration;

use patchbay_api::{Acquia, CredentialCache, Dispatcher, Pantheon, TransportConfig};
use patchbay_config::{Config, KeyringCredentials};
use patchbay_core::{Inventory, Store};

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Everything a command handler needs, built once per invocation.
pub struct App {
    pub inventory: Inventory,
    pub credentials: Arc<dyn CredentialCache>,
    pub output: OutputFormat,
    default_provider: Option<String>,
}

impl App {
    /// Wire up the store, credential cache, dispatcher, and the known
    /// providers from config plus CLI flags.
    pub fn build(config: &Config, global: &GlobalOpts) -> Result<Self, CliError> {
        let db_path = patchbay_config::cache_db_path(config);
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let store = Store::open(&db_path)?;

        let credentials: Arc<dyn CredentialCache> = Arc::new(KeyringCredentials::new());
        let transport = TransportConfig {
            timeout: Duration::from_secs(global.timeout.unwrap_or(config.defaults.timeout)),
        };
        let dispatcher = Arc::new(Dispatcher::new(&transport)?);

        let mut inventory = Inventory::new(store).with_refresh(global.refresh);
        inventory.register(Arc::new(Acquia::new(
            Arc::clone(&dispatcher),
            Arc::clone(&credentials),
        )));
        inventory.register(Arc::new(Pantheon::new(
            dispatcher,
            Arc::clone(&credentials),
        )));

        let output = global.output.clone().unwrap_or_else(|| {
            match config.defaults.output.as_str() {
                "json" => OutputFormat::Json,
                _ => OutputFormat::Table,
            }
        });

        Ok(Self {
            inventory,
            credentials,
            output,
            default_provider: global
                .provider
                .clone()
                .or_else(|| config.default_provider.clone()),
        })
    }

    /// The provider this invocation operates on.
    pub fn provider_name(&self) -> Result<String, CliError> {
        self.default_provider.clone().ok_or(CliError::NoProvider)
    }
}

/// Dispatch a parsed command to the appropriate handler.
pub async fn dispatch(cmd: Command, app: &mut App, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Providers => providers::handle(app, global),
        Command::Sites => sites::list(app, global).await,
        Command::Site { name } => sites::details(app, &name, global).await,
        Command::Envs { name, environment } => {
            sites::environments(app, &name, environment.as_deref(), global).await
        }
        Command::Vcs { name } => sites::vcs(app, &name, global).await,
        Command::Auth(args) => auth::handle(args, app, global).await,
    }
}
