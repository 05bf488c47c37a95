//! Provider listing.

use serde::Serialize;
use tabled::Tabled;

use crate::cli::GlobalOpts;
use crate::commands::App;
use crate::error::CliError;
use crate::output;

#[derive(Tabled, Serialize)]
struct ProviderRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Homepage")]
    homepage: String,
}

pub fn handle(app: &App, global: &GlobalOpts) -> Result<(), CliError> {
    let rows: Vec<ProviderRow> = app
        .inventory
        .providers()
        .map(|provider| ProviderRow {
            name: provider.name().to_owned(),
            label: provider.label().to_owned(),
            homepage: provider.homepage().to_owned(),
        })
        .collect();

    let rendered = output::render_list(&app.output, &rows)?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
