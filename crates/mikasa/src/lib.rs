//! Session and token lifecycle for the CampusConnect client.
//!
//! This crate provides:
//! - Email OTP login against the identity provider
//! - Session restore on startup with refresh token rotation
//! - An in-memory access token cache with single-flight refresh
//! - Credential persistence through `campus-storage`
//! - Builders for authenticated backend requests

mod cache;
mod error;
mod profile;
mod provider;
mod request;
mod session;
mod state;
mod tasks;

pub use cache::{AuthenticatedUser, TokenCache, TokenEntry, EXPIRY_SKEW_SECS};
pub use error::{SessionError, SessionResult};
pub use profile::{ProfileProbe, RestProfileProbe};
pub use provider::{AuthGrant, IdentityProvider, ProviderClient};
pub use request::RequestFactory;
pub use session::{RefreshConfig, SessionCoordinator};
pub use state::{SessionSnapshot, SessionState};
pub use tasks::{spawn_periodic, PeriodicTask};
