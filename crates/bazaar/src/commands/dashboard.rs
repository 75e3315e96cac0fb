//! Dashboard totals.

use bazaar_api::models::DashboardStats;
use bazaar_core::{Console, Resource};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub fn render(stats: &DashboardStats) -> String {
    output::detail(&[
        ("Users", stats.total_users.to_string()),
        ("Riders", stats.total_riders.to_string()),
        ("Vendors", stats.total_vendors.to_string()),
        ("Deliveries", stats.total_deliveries.to_string()),
        ("Recent activity", stats.recent_activity.len().to_string()),
    ])
}

pub async fn handle(console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    let stats: DashboardStats = console.fetch_as(&Resource::Dashboard).await?;
    let out = output::render_single(global.output, &stats, render, |s| {
        s.total_users.to_string()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
