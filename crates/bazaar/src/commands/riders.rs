//! Rider command handlers.

use tabled::Tabled;

use bazaar_api::models::{MonthlyRides, MonthlyStats, RideStats, Rider, RiderList};
use bazaar_core::{Console, Resource};

use crate::cli::{GlobalOpts, RidersArgs, RidersCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct RiderRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "Vehicle")]
    vehicle: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Online")]
    online: String,
    #[tabled(rename = "Deliveries")]
    deliveries: String,
}

impl RiderRow {
    fn new(r: &Rider, color: bool) -> Self {
        Self {
            id: r.id.clone(),
            name: util::opt(r.full_name.as_ref()),
            phone: util::opt(r.phone.as_ref()),
            vehicle: util::opt(r.vehicle_type.as_ref()),
            status: output::status(&util::opt(r.status.as_ref()), color),
            online: if r.is_online { "yes" } else { "" }.into(),
            deliveries: util::opt(r.counts.as_ref().map(|c| &c.deliveries)),
        }
    }
}

#[derive(Tabled)]
struct MonthRow {
    #[tabled(rename = "Month")]
    month: String,
    #[tabled(rename = "Rides")]
    rides: u64,
}

fn rider_detail(r: &Rider) -> String {
    output::detail(&[
        ("ID", r.id.clone()),
        ("Name", util::opt(r.full_name.as_ref())),
        ("Phone", util::opt(r.phone.as_ref())),
        ("Vehicle", util::opt(r.vehicle_type.as_ref())),
        ("Status", util::opt(r.status.as_ref())),
        ("Online", r.is_online.to_string()),
        ("Last seen", util::opt(r.last_seen_at.as_ref())),
        (
            "Deliveries",
            util::opt(r.counts.as_ref().map(|c| &c.deliveries)),
        ),
    ])
}

fn stats_detail(s: &RideStats) -> String {
    output::detail(&[
        ("Deliveries", s.total_deliveries.to_string()),
        ("Riders", s.total_riders.to_string()),
        ("Approved", s.approved.to_string()),
        ("Pending", s.pending.to_string()),
        ("Rejected", s.rejected.to_string()),
    ])
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    console: &Console,
    args: RidersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(global.color);
    let out = match args.command {
        RidersCommand::List => {
            let list: RiderList = console.fetch_as(&Resource::Riders).await?;
            output::render_list(
                global.output,
                &list.riders,
                |r| RiderRow::new(r, color),
                |r| r.id.clone(),
            )
        }
        RidersCommand::Show { id } => {
            let rider: Rider = console.fetch_as(&Resource::Rider(id)).await?;
            output::render_single(global.output, &rider, rider_detail, |r| r.id.clone())
        }
        RidersCommand::Stats => {
            let stats: RideStats = console.fetch_as(&Resource::RiderStats).await?;
            output::render_single(global.output, &stats, stats_detail, |s| {
                s.total_deliveries.to_string()
            })
        }
        RidersCommand::Monthly => {
            let monthly: MonthlyStats = console.fetch_as(&Resource::RiderMonthly).await?;
            let series = monthly.series();
            output::render_list(
                global.output,
                &series,
                |m: &MonthlyRides| MonthRow {
                    month: m.month.clone(),
                    rides: m.rides,
                },
                |m| format!("{}\t{}", m.month, m.rides),
            )
        }
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
