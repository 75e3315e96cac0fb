//! KYC review handlers.

use tabled::Tabled;

use bazaar_api::models::{KycDecision, KycRequest};
use bazaar_core::{Command as CoreCommand, Console, Resource};

use crate::cli::{GlobalOpts, KycArgs, KycCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct KycRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Document")]
    document: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Submitted")]
    submitted: String,
}

pub async fn handle(
    console: &Console,
    args: KycArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (id, decision) = match args.command {
        KycCommand::List => {
            let color = output::should_color(global.color);
            let requests: Vec<KycRequest> = console.fetch_as(&Resource::Kyc).await?;
            let out = output::render_list(
                global.output,
                &requests,
                |r| KycRow {
                    id: r.id.clone(),
                    user: util::opt(r.user_id.as_ref()),
                    document: util::opt(r.document_type.as_ref()),
                    status: output::status(&util::opt(r.status.as_ref()), color),
                    submitted: util::opt(r.created_at.as_ref()),
                },
                |r| r.id.clone(),
            );
            output::print_output(&out, global.quiet);
            return Ok(());
        }
        KycCommand::Approve { id } => (id, KycDecision::Approved),
        KycCommand::Reject { id } => (id, KycDecision::Rejected),
    };

    console
        .execute(CoreCommand::UpdateKycStatus {
            id: id.clone(),
            decision,
        })
        .await?;
    output::print_done(
        &format!("KYC request {id} marked {decision}"),
        global.quiet,
    );
    Ok(())
}
