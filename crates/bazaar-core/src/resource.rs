// ── Back-office resources ──
//
// Every readable thing in the back office, with its cache key and the
// API call that produces it. Keys carry no token: the cache is cleared
// whenever the signed-in admin changes. Single records live under an
// `/:id` path with the id as a parameter, so no id can spell a list path.

use std::time::Duration;

use bazaar_api::AdminClient;
use bazaar_api::models::filter_users_by_role;
use serde::Serialize;
use serde_json::Value;

use crate::key::ResourceKey;
use crate::policy::RevalidationConfig;

pub(crate) mod paths {
    pub const DASHBOARD: &str = "/dashboard";
    pub const USERS: &str = "/users";
    pub const USER: &str = "/users/:id";
    pub const RIDERS: &str = "/riders";
    pub const RIDER: &str = "/riders/:id";
    pub const RIDER_STATS: &str = "/rider-stats";
    pub const RIDER_MONTHLY: &str = "/rider-stats/monthly";
    pub const VENDORS: &str = "/vendors";
    pub const VENDOR: &str = "/vendors/:id";
    pub const VENDOR_APPLICATIONS: &str = "/vendors/applications";
    pub const LISTINGS: &str = "/listings";
    pub const LISTING: &str = "/listings/:id";
    pub const KYC: &str = "/kyc";
    pub const REPORTS: &str = "/reports";
    pub const CATEGORIES: &str = "/categories";
}

/// A readable back-office resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    Dashboard,
    /// Users, optionally restricted to some roles (admins are always
    /// excluded when filtering).
    Users {
        roles: Vec<String>,
    },
    User(String),
    Riders,
    Rider(String),
    RiderStats,
    RiderMonthly,
    VendorApplications,
    Vendor(String),
    Listings,
    Listing(String),
    Kyc,
    Reports,
    Categories,
}

impl Resource {
    pub fn users() -> Self {
        Self::Users { roles: Vec::new() }
    }

    pub fn users_with_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Users {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn key(&self) -> ResourceKey {
        match self {
            Self::Dashboard => ResourceKey::new(paths::DASHBOARD),
            Self::Users { roles } if roles.is_empty() => ResourceKey::new(paths::USERS),
            Self::Users { roles } => ResourceKey::new(paths::USERS).with(roles.clone()),
            Self::User(id) => ResourceKey::new(paths::USER).with(id.as_str()),
            Self::Riders => ResourceKey::new(paths::RIDERS),
            Self::Rider(id) => ResourceKey::new(paths::RIDER).with(id.as_str()),
            Self::RiderStats => ResourceKey::new(paths::RIDER_STATS),
            Self::RiderMonthly => ResourceKey::new(paths::RIDER_MONTHLY),
            Self::VendorApplications => ResourceKey::new(paths::VENDOR_APPLICATIONS),
            Self::Vendor(id) => ResourceKey::new(paths::VENDOR).with(id.as_str()),
            Self::Listings => ResourceKey::new(paths::LISTINGS),
            Self::Listing(id) => ResourceKey::new(paths::LISTING).with(id.as_str()),
            Self::Kyc => ResourceKey::new(paths::KYC),
            Self::Reports => ResourceKey::new(paths::REPORTS),
            Self::Categories => ResourceKey::new(paths::CATEGORIES),
        }
    }

    /// Refresh cadence the web dashboard historically used for this
    /// resource. Opt-in: nothing applies it implicitly.
    pub fn recommended_revalidation(&self) -> RevalidationConfig {
        let every = match self {
            Self::Riders | Self::Listings | Self::Users { .. } => Duration::from_secs(30),
            Self::RiderMonthly => Duration::from_secs(60),
            _ => Duration::from_secs(10),
        };
        RevalidationConfig::default().with_poll_interval(every)
    }

    /// Fetch and normalize through `client`, as JSON for the cache.
    pub(crate) async fn fetch(&self, client: &AdminClient) -> Result<Value, bazaar_api::Error> {
        match self {
            Self::Dashboard => to_json(client.dashboard_stats().await?),
            Self::Users { roles } => {
                let users = client.list_users().await?;
                to_json(filter_users_by_role(users, roles))
            }
            Self::User(id) => to_json(client.get_user(id).await?),
            Self::Riders => to_json(client.list_riders().await?),
            Self::Rider(id) => to_json(client.get_rider(id).await?),
            Self::RiderStats => to_json(client.rider_stats().await?),
            Self::RiderMonthly => to_json(client.rider_monthly_stats().await?),
            Self::VendorApplications => to_json(client.vendor_applications().await?),
            Self::Vendor(id) => to_json(client.get_vendor(id).await?),
            Self::Listings => to_json(client.list_products().await?),
            Self::Listing(id) => to_json(client.get_listing(id).await?),
            Self::Kyc => to_json(client.kyc_requests().await?),
            Self::Reports => to_json(client.reports().await?),
            Self::Categories => to_json(client.categories().await?),
        }
    }
}

fn to_json(value: impl Serialize) -> Result<Value, bazaar_api::Error> {
    serde_json::to_value(value).map_err(|e| bazaar_api::Error::Deserialization {
        message: e.to_string(),
        body: String::new(),
    })
}
