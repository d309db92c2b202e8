use crate::api::{ApiClientFactory, ApiType, LegalApiClient, RequestContext};
use crate::cli::args::{SearchArgs, SourceArg};
use crate::cli::OutputFormat;
use crate::config::Config;
use crate::error::{Result, WarpError};
use crate::output;

/// Client for the selected sources; a single source only needs its own key
fn source_client(config: &Config, source: SourceArg) -> Result<Box<dyn LegalApiClient>> {
    let api_type = match source {
        SourceArg::All => ApiType::All,
        SourceArg::Nlic => ApiType::Nlic,
        SourceArg::Elis => ApiType::Elis,
    };
    ApiClientFactory::from_config(api_type, config)
}

/// Execute unified search across national laws and local ordinances
pub async fn execute(ctx: &RequestContext, args: SearchArgs, format: OutputFormat) -> Result<()> {
    if args.query.trim().is_empty() {
        return Err(WarpError::InvalidInput("Search query cannot be empty".to_string()));
    }

    let config = Config::load()?;
    let client = source_client(&config, args.source)?;

    let mut request = args.page.request(args.query);
    request.region = args.region;
    request.law_type = args.law_type;
    request.department = args.department;

    let response = client.search(ctx, request).await?;

    if response.items.is_empty() && format == OutputFormat::Table {
        println!("No results found for your search query.");
        return Ok(());
    }
    println!("{}", output::format_search_response(&response, format)?);
    Ok(())
}
