use crate::api::types::ResponseType;
use crate::api::{ApiType, RequestContext};
use crate::cli::args::{DetailCommand, InterpretationArgs};
use crate::cli::OutputFormat;
use crate::error::Result;

use super::{configured_client, print_detail, print_search, require_query};

/// Execute legal interpretation command
pub async fn execute(
    ctx: &RequestContext,
    args: InterpretationArgs,
    format: OutputFormat,
) -> Result<()> {
    let client = configured_client(ApiType::Expc)?;

    match args.command {
        Some(DetailCommand::Detail { id }) => print_detail(ctx, client.as_ref(), &id, format).await,
        None => {
            let query = require_query(args.query, "interpretation")?;
            let mut request = args.page.request(query);
            // The service has no JSON output
            request.response_type = ResponseType::Xml;
            request.department = args.department;
            print_search(ctx, client.as_ref(), request, format).await
        }
    }
}
