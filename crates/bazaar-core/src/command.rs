// ── Command API ──
//
// All back-office writes flow through a unified `Command` enum. Each
// variant knows which cached resources it can change; the console routes
// it to the matching API call through the mutation coordinator.

use bazaar_api::models::{CategoryForm, KycDecision};

use crate::error::CoreError;
use crate::key::Invalidation;
use crate::resource::{Resource, paths};

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<serde_json::Value, CoreError>>,
}

/// All possible writes against the back office.
#[derive(Debug, Clone)]
pub enum Command {
    // ── Users ────────────────────────────────────────────────────────
    BanUser { id: String },
    UnbanUser { id: String },
    UpdateUserRole { id: String, role: String },

    // ── Listings ─────────────────────────────────────────────────────
    ApproveListing { id: String },
    RejectListing { id: String, note: String },
    RemoveListing { id: String },

    // ── Vendors ──────────────────────────────────────────────────────
    ApproveVendor { id: String },
    RejectVendor { id: String, note: String },

    // ── KYC and reports ──────────────────────────────────────────────
    UpdateKycStatus { id: String, decision: KycDecision },
    ResolveReport { id: String },

    // ── Categories ───────────────────────────────────────────────────
    AddCategory { form: CategoryForm },
    EditCategory { id: String, form: CategoryForm },
    DeleteCategory { id: String },
}

impl Command {
    /// Cached resources this command can change.
    pub fn affected(&self) -> Vec<Invalidation> {
        match self {
            Self::BanUser { id } | Self::UnbanUser { id } | Self::UpdateUserRole { id, .. } => {
                vec![
                    key(&Resource::User(id.clone())),
                    Invalidation::path(paths::USERS),
                    Invalidation::path(paths::DASHBOARD),
                ]
            }
            Self::ApproveListing { id }
            | Self::RejectListing { id, .. }
            | Self::RemoveListing { id } => vec![
                key(&Resource::Listing(id.clone())),
                Invalidation::path(paths::LISTINGS),
                Invalidation::path(paths::DASHBOARD),
            ],
            Self::ApproveVendor { .. } | Self::RejectVendor { .. } => vec![
                Invalidation::prefix(paths::VENDORS),
                Invalidation::path(paths::USERS),
                Invalidation::path(paths::DASHBOARD),
            ],
            Self::UpdateKycStatus { .. } => vec![Invalidation::path(paths::KYC)],
            Self::ResolveReport { .. } => vec![Invalidation::path(paths::REPORTS)],
            Self::AddCategory { .. } | Self::EditCategory { .. } | Self::DeleteCategory { .. } => {
                vec![Invalidation::path(paths::CATEGORIES)]
            }
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BanUser { .. } => "ban-user",
            Self::UnbanUser { .. } => "unban-user",
            Self::UpdateUserRole { .. } => "update-user-role",
            Self::ApproveListing { .. } => "approve-listing",
            Self::RejectListing { .. } => "reject-listing",
            Self::RemoveListing { .. } => "remove-listing",
            Self::ApproveVendor { .. } => "approve-vendor",
            Self::RejectVendor { .. } => "reject-vendor",
            Self::UpdateKycStatus { .. } => "update-kyc-status",
            Self::ResolveReport { .. } => "resolve-report",
            Self::AddCategory { .. } => "add-category",
            Self::EditCategory { .. } => "edit-category",
            Self::DeleteCategory { .. } => "delete-category",
        }
    }
}

fn key(resource: &Resource) -> Invalidation {
    Invalidation::Key(resource.key())
}
