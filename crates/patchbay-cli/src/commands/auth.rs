//! Credential management: login, logout, status.

use secrecy::SecretString;
use serde::Serialize;
use tabled::Tabled;

use patchbay_api::auth_namespace;

use crate::cli::{AuthArgs, AuthCommand, GlobalOpts};
use crate::commands::App;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: AuthArgs, app: &mut App, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        AuthCommand::Login { email } => login(app, email, global).await,
        AuthCommand::Logout => logout(app, global),
        AuthCommand::Status => status(app, global),
    }
}

async fn login(app: &mut App, email: Option<String>, global: &GlobalOpts) -> Result<(), CliError> {
    let provider_name = app.provider_name()?;
    let provider = app.inventory.provider(&provider_name)?;

    let email = match email {
        Some(email) => email,
        None => prompt_email()?,
    };
    let password = SecretString::from(rpassword::prompt_password("Password: ")?);

    match provider.authenticator() {
        // session-based vendors run their login flow, which caches the
        // session wholesale on success
        Some(authenticator) => {
            authenticator.login(&email, &password).await?;
            if !global.quiet {
                eprintln!("Logged in to {}", provider.label());
            }
        }
        // basic-auth vendors just need the credentials stored; every
        // request authenticates itself
        None => {
            use secrecy::ExposeSecret;
            let namespace = auth_namespace(&provider_name);
            app.credentials.set(&namespace, "email", &email);
            app.credentials
                .set(&namespace, "password", password.expose_secret());
            if !global.quiet {
                eprintln!("Stored credentials for {}", provider.label());
            }
        }
    }
    Ok(())
}

fn logout(app: &mut App, global: &GlobalOpts) -> Result<(), CliError> {
    let provider_name = app.provider_name()?;
    let provider = app.inventory.provider(&provider_name)?;
    let label = provider.label().to_owned();

    app.credentials.clear(&auth_namespace(&provider_name));
    if !global.quiet {
        eprintln!("Forgot all credentials for {label}");
    }
    Ok(())
}

#[derive(Tabled, Serialize)]
struct StatusRow {
    #[tabled(rename = "Provider")]
    provider: String,
    #[tabled(rename = "Status")]
    status: String,
}

fn status(app: &App, global: &GlobalOpts) -> Result<(), CliError> {
    let rows: Vec<StatusRow> = app
        .inventory
        .providers()
        .map(|provider| {
            let namespace = auth_namespace(provider.name());
            let authenticated = match provider.authenticator() {
                Some(authenticator) => authenticator.is_logged_in(),
                None => {
                    app.credentials.get(&namespace, "email").is_some()
                        && app.credentials.get(&namespace, "password").is_some()
                }
            };
            StatusRow {
                provider: provider.name().to_owned(),
                status: if authenticated {
                    "authenticated".to_owned()
                } else {
                    "no credentials".to_owned()
                },
            }
        })
        .collect();

    let rendered = output::render_list(&app.output, &rows)?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

fn prompt_email() -> Result<String, CliError> {
    dialoguer::Input::new()
        .with_prompt("Email")
        .interact_text()
        .map_err(|error| CliError::Io(std::io::Error::other(error)))
}
