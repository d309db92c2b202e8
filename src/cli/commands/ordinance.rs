use crate::api::{ApiType, RequestContext};
use crate::cli::args::{DetailCommand, OrdinanceArgs};
use crate::cli::OutputFormat;
use crate::error::Result;

use super::{configured_client, print_detail, print_search, require_query};

/// Execute ordinance command
pub async fn execute(ctx: &RequestContext, args: OrdinanceArgs, format: OutputFormat) -> Result<()> {
    let client = configured_client(ApiType::Elis)?;

    match args.command {
        Some(DetailCommand::Detail { id }) => print_detail(ctx, client.as_ref(), &id, format).await,
        None => {
            let query = require_query(args.query, "ordinance")?;
            let mut request = args.page.request(query);
            request.region = args.region;
            request.law_type = args.law_type;
            print_search(ctx, client.as_ref(), request, format).await
        }
    }
}
