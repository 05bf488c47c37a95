//! Site and environment command handlers.

use patchbay_core::Record;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::GlobalOpts;
use crate::commands::App;
use crate::error::CliError;
use crate::output;

#[derive(Tabled, Serialize)]
struct SiteRow {
    #[tabled(rename = "Site")]
    name: String,
}

#[derive(Tabled, Serialize)]
struct EnvironmentRow {
    #[tabled(rename = "Environment")]
    name: String,
    #[tabled(rename = "Branch")]
    branch: String,
    #[tabled(rename = "Host")]
    host: String,
}

/// `patchbay sites`: sync the provider's site list and print it.
pub async fn list(app: &mut App, global: &GlobalOpts) -> Result<(), CliError> {
    let provider = app.provider_name()?;
    let names = app.inventory.sync_sites(&provider).await?;
    let rows: Vec<SiteRow> = names.into_iter().map(|name| SiteRow { name }).collect();

    let rendered = output::render_list(&app.output, &rows)?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

/// `patchbay site <name>`: resolve and print every known field.
pub async fn details(app: &mut App, name: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let provider = app.provider_name()?;
    let details = app.inventory.site_details(&provider, name).await?;

    let rendered = output::render_details(&app.output, &details)?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

/// `patchbay envs <name> [environment]`: list a site's environments, or
/// show one environment's deployment attributes.
pub async fn environments(
    app: &mut App,
    name: &str,
    environment: Option<&str>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let provider = app.provider_name()?;

    if let Some(environment) = environment {
        let details = app
            .inventory
            .environment_details(&provider, name, environment)
            .await?;
        let rendered = output::render_details(&app.output, &details)?;
        output::print_output(&rendered, global.quiet);
        return Ok(());
    }

    let site = app.inventory.site(&provider, name)?;
    let rows: Vec<EnvironmentRow> = site
        .environments()
        .map(|env| EnvironmentRow {
            name: env.name().to_owned(),
            branch: env.peek("branch").unwrap_or_default().to_owned(),
            host: env.peek("host").unwrap_or_default().to_owned(),
        })
        .collect();

    let rendered = output::render_list(&app.output, &rows)?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

/// `patchbay vcs <name>`: print the repository clone URL, plain, for
/// scripting.
pub async fn vcs(app: &mut App, name: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let provider = app.provider_name()?;
    match app.inventory.site_vcs_url(&provider, name).await? {
        Some(url) => {
            output::print_output(&url, global.quiet);
            Ok(())
        }
        None => Err(CliError::ApiError {
            message: format!("no repository information for site '{name}'"),
        }),
    }
}
