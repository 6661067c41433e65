//! Session and identity management
//!
//! Holds the signed-in identity and its organization. Credentials resolve
//! against a pluggable [`IdentityBackend`]; the default backend is a fixed
//! mock table.

mod backend;
mod plans;
mod store;
mod types;

pub use backend::{IdentityBackend, MockIdentityBackend, SignUpRequest};
pub use plans::{all_plans, find_plan, lowest_tier_plan, Plan, PlanFeature};
pub use store::{SessionSnapshot, SessionStore};
pub use types::{Identity, Organization, Role};

use thiserror::Error;

/// Errors surfaced by the session store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The email/secret pair does not match any known account
    #[error("Invalid credentials")]
    InvalidCredentials,
}
