// bazaar-api: Async Rust client for the marketplace back-office REST API

pub mod auth;
pub mod client;
mod endpoints;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::{AdminProfile, AdminSession, AuthContext, LoginRequest};
pub use client::{AdminClient, ApiArea, ApiAreas};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
