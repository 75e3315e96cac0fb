//! Vendor application handlers.

use tabled::Tabled;

use bazaar_api::models::{Vendor, VendorApplication};
use bazaar_core::{Command as CoreCommand, Console, Resource};

use crate::cli::{GlobalOpts, VendorsArgs, VendorsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct ApplicationRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Business")]
    business: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Submitted")]
    submitted: String,
}

impl ApplicationRow {
    fn new(a: &VendorApplication, color: bool) -> Self {
        Self {
            id: a.id.clone(),
            business: util::opt(a.business_name.as_ref()),
            status: output::status(&util::opt(a.status.as_ref()), color),
            user: util::opt(a.user_id.as_ref()),
            submitted: util::opt(a.created_at.as_ref()),
        }
    }
}

fn detail(v: &Vendor) -> String {
    output::detail(&[
        ("ID", v.id.clone()),
        ("Business", util::opt(v.business_name.as_ref())),
        ("Status", util::opt(v.status.as_ref())),
    ])
}

pub async fn handle(
    console: &Console,
    args: VendorsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(global.color);
    match args.command {
        VendorsCommand::Applications => {
            let apps: Vec<VendorApplication> =
                console.fetch_as(&Resource::VendorApplications).await?;
            let out = output::render_list(
                global.output,
                &apps,
                |a| ApplicationRow::new(a, color),
                |a| a.id.clone(),
            );
            output::print_output(&out, global.quiet);
        }

        VendorsCommand::Show { id } => {
            let vendor: Vendor = console.fetch_as(&Resource::Vendor(id)).await?;
            let out = output::render_single(global.output, &vendor, detail, |v| v.id.clone());
            output::print_output(&out, global.quiet);
        }

        VendorsCommand::Approve { id } => {
            console
                .execute(CoreCommand::ApproveVendor { id: id.clone() })
                .await?;
            output::print_done(&format!("Vendor {id} approved"), global.quiet);
        }

        VendorsCommand::Reject { id, note } => {
            console
                .execute(CoreCommand::RejectVendor {
                    id: id.clone(),
                    note,
                })
                .await?;
            output::print_done(&format!("Vendor {id} rejected"), global.quiet);
        }
    }
    Ok(())
}
