use crate::api::{ApiType, RequestContext};
use crate::cli::args::{LawArgs, LawCommand};
use crate::cli::OutputFormat;
use crate::error::Result;
use crate::output;

use super::{configured_client, print_detail, print_search, require_query};

/// Execute law command
pub async fn execute(ctx: &RequestContext, args: LawArgs, format: OutputFormat) -> Result<()> {
    let client = configured_client(ApiType::Nlic)?;

    match args.command {
        Some(LawCommand::Detail { id }) => print_detail(ctx, client.as_ref(), &id, format).await,
        Some(LawCommand::History { id }) => {
            let history = client.get_history(ctx, &id).await?;
            println!("{}", output::format_law_history(&history, format)?);
            Ok(())
        }
        None => {
            let query = require_query(args.query, "law")?;
            let mut request = args.page.request(query);
            request.law_type = args.law_type;
            request.department = args.department;
            print_search(ctx, client.as_ref(), request, format).await
        }
    }
}
