//! Report handlers.

use tabled::Tabled;

use bazaar_api::models::Report;
use bazaar_core::{Command as CoreCommand, Console, Resource};

use crate::cli::{GlobalOpts, ReportsArgs, ReportsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Reason")]
    reason: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Reporter")]
    reporter: String,
    #[tabled(rename = "Created")]
    created: String,
}

pub async fn handle(
    console: &Console,
    args: ReportsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ReportsCommand::List => {
            let color = output::should_color(global.color);
            let reports: Vec<Report> = console.fetch_as(&Resource::Reports).await?;
            let out = output::render_list(
                global.output,
                &reports,
                |r| ReportRow {
                    id: r.id.clone(),
                    reason: util::opt(r.reason.as_ref()),
                    status: output::status(&util::opt(r.status.as_ref()), color),
                    reporter: util::opt(r.reporter_id.as_ref()),
                    created: util::opt(r.created_at.as_ref()),
                },
                |r| r.id.clone(),
            );
            output::print_output(&out, global.quiet);
        }
        ReportsCommand::Resolve { id } => {
            console
                .execute(CoreCommand::ResolveReport { id: id.clone() })
                .await?;
            output::print_done(&format!("Report {id} resolved"), global.quiet);
        }
    }
    Ok(())
}
