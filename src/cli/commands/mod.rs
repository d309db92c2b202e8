pub mod admrule;
pub mod config;
pub mod interpretation;
pub mod law;
pub mod ordinance;
pub mod precedent;
pub mod search;

use log::info;

use crate::api::types::UnifiedSearchRequest;
use crate::api::{ApiClientFactory, ApiType, LegalApiClient, RequestContext};
use crate::cli::OutputFormat;
use crate::config::Config;
use crate::error::{Result, WarpError};
use crate::output;

/// Client for `api_type` built from the user's configuration file
pub(crate) fn configured_client(api_type: ApiType) -> Result<Box<dyn LegalApiClient>> {
    let config = Config::load()?;
    ApiClientFactory::from_config(api_type, &config)
}

pub(crate) fn require_query(query: Option<String>, command: &str) -> Result<String> {
    match query {
        Some(query) if !query.trim().is_empty() => Ok(query),
        _ => Err(WarpError::InvalidInput(format!(
            "No search query provided. Use 'warp {} <query>'",
            command
        ))),
    }
}

/// Run a search and print the page
pub(crate) async fn print_search(
    ctx: &RequestContext,
    client: &dyn LegalApiClient,
    request: UnifiedSearchRequest,
    format: OutputFormat,
) -> Result<()> {
    info!("Searching {} for '{}'", client.api_type().display_name(), request.query);
    let response = client.search(ctx, request).await?;

    if response.items.is_empty() && format == OutputFormat::Table {
        println!("No results found for your search query.");
        return Ok(());
    }
    println!("{}", output::format_search_response(&response, format)?);
    Ok(())
}

/// Fetch one document and print it
pub(crate) async fn print_detail(
    ctx: &RequestContext,
    client: &dyn LegalApiClient,
    id: &str,
    format: OutputFormat,
) -> Result<()> {
    let detail = client.get_detail(ctx, id).await?;
    println!("{}", output::format_law_detail(&detail, format)?);
    Ok(())
}
