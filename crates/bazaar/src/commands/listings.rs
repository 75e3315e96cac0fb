//! Listing moderation handlers.

use tabled::Tabled;

use bazaar_api::models::Product;
use bazaar_core::{Command as CoreCommand, Console, Resource};

use crate::cli::{GlobalOpts, ListingsArgs, ListingsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ListingRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Seller")]
    seller: String,
}

impl ListingRow {
    fn new(p: &Product, color: bool) -> Self {
        Self {
            id: p.id.clone(),
            title: p.title.clone(),
            price: price(p),
            status: output::status(&util::opt(p.status.as_ref()), color),
            seller: seller(p),
        }
    }
}

/// `price` when the server sends it, otherwise `priceCents` in units.
#[allow(clippy::cast_precision_loss)]
fn price(p: &Product) -> String {
    let amount = p
        .price
        .or_else(|| p.price_cents.map(|c| c as f64 / 100.0));
    match (amount, p.currency.as_deref()) {
        (Some(a), Some(cur)) => format!("{a:.2} {cur}"),
        (Some(a), None) => format!("{a:.2}"),
        (None, _) => String::new(),
    }
}

fn seller(p: &Product) -> String {
    p.seller
        .as_ref()
        .and_then(|s| s.name.clone().or_else(|| s.email.clone()))
        .or_else(|| p.seller_id.clone())
        .unwrap_or_default()
}

fn detail(p: &Product) -> String {
    output::detail(&[
        ("ID", p.id.clone()),
        ("Title", p.title.clone()),
        ("Description", util::opt(p.description.as_ref())),
        ("Price", price(p)),
        ("Condition", util::opt(p.condition.as_ref())),
        ("Stock", util::opt(p.stock.as_ref())),
        ("Digital", p.is_digital.to_string()),
        ("Status", util::opt(p.status.as_ref())),
        ("Seller", seller(p)),
        ("Category", util::opt(p.category_id.as_ref())),
        ("Created", util::opt(p.created_at.as_ref())),
        ("Updated", util::opt(p.updated_at.as_ref())),
    ])
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    console: &Console,
    args: ListingsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(global.color);
    match args.command {
        ListingsCommand::List => {
            let products: Vec<Product> = console.fetch_as(&Resource::Listings).await?;
            let out = output::render_list(
                global.output,
                &products,
                |p| ListingRow::new(p, color),
                |p| p.id.clone(),
            );
            output::print_output(&out, global.quiet);
        }

        ListingsCommand::Show { id } => {
            let product: Product = console.fetch_as(&Resource::Listing(id)).await?;
            let out = output::render_single(global.output, &product, detail, |p| p.id.clone());
            output::print_output(&out, global.quiet);
        }

        ListingsCommand::Approve { id } => {
            console
                .execute(CoreCommand::ApproveListing { id: id.clone() })
                .await?;
            output::print_done(&format!("Listing {id} approved"), global.quiet);
        }

        ListingsCommand::Reject { id, note } => {
            console
                .execute(CoreCommand::RejectListing {
                    id: id.clone(),
                    note,
                })
                .await?;
            output::print_done(&format!("Listing {id} rejected"), global.quiet);
        }

        ListingsCommand::Remove { id } => {
            if !util::confirm(
                &format!("Remove listing '{id}'? Sellers are notified."),
                "listings remove",
                global.yes,
            )? {
                return Ok(());
            }
            console
                .execute(CoreCommand::RemoveListing { id: id.clone() })
                .await?;
            output::print_done(&format!("Listing {id} removed"), global.quiet);
        }
    }
    Ok(())
}
