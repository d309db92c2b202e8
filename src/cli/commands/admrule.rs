use crate::api::{ApiType, RequestContext};
use crate::cli::args::{AdmruleArgs, DetailCommand};
use crate::cli::OutputFormat;
use crate::error::Result;

use super::{configured_client, print_detail, print_search, require_query};

/// Execute administrative rule command
pub async fn execute(ctx: &RequestContext, args: AdmruleArgs, format: OutputFormat) -> Result<()> {
    let client = configured_client(ApiType::Admrul)?;

    match args.command {
        Some(DetailCommand::Detail { id }) => print_detail(ctx, client.as_ref(), &id, format).await,
        None => {
            let query = require_query(args.query, "admrule")?;
            let mut request = args.page.request(query);
            request.law_type = args.law_type;
            request.department = args.department;
            print_search(ctx, client.as_ref(), request, format).await
        }
    }
}
