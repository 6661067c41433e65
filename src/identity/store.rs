//! The session store
//!
//! One instance per application, shared by reference. Writes are serialized
//! by a single async guard; the state itself sits behind a short-lived lock
//! so readers can observe the pending flag while a backend call is running.

use super::{AuthError, Identity, IdentityBackend, Organization, Plan, SignUpRequest};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct SessionState {
    identity: Option<Identity>,
    organization: Option<Organization>,
    pending: bool,
}

/// Point-in-time view of the session
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionSnapshot {
    pub identity: Option<Identity>,
    pub organization: Option<Organization>,
    /// A sign-in or sign-up is in flight
    pub loading: bool,
}

/// Clears the pending flag when a backend call ends, including when the
/// calling future is dropped mid-flight.
struct PendingGuard<'a> {
    state: &'a RwLock<SessionState>,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        write_state(self.state).pending = false;
    }
}

fn read_state(state: &RwLock<SessionState>) -> RwLockReadGuard<'_, SessionState> {
    state.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_state(state: &RwLock<SessionState>) -> RwLockWriteGuard<'_, SessionState> {
    state.write().unwrap_or_else(PoisonError::into_inner)
}

/// Holds the current identity and organization
pub struct SessionStore {
    backend: Arc<dyn IdentityBackend>,
    state: RwLock<SessionState>,
    writer: Mutex<()>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn IdentityBackend>) -> Self {
        Self {
            backend,
            state: RwLock::new(SessionState::default()),
            writer: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = read_state(&self.state);
        SessionSnapshot {
            identity: state.identity.clone(),
            organization: state.organization.clone(),
            loading: state.pending,
        }
    }

    pub fn identity(&self) -> Option<Identity> {
        read_state(&self.state).identity.clone()
    }

    pub fn organization(&self) -> Option<Organization> {
        read_state(&self.state).organization.clone()
    }

    fn begin_pending(&self) -> PendingGuard<'_> {
        write_state(&self.state).pending = true;
        PendingGuard { state: &self.state }
    }

    /// Sign in with an email/secret pair
    ///
    /// On failure the previous identity (if any) is left untouched.
    pub async fn sign_in(&self, email: &str, secret: &str) -> Result<Identity, AuthError> {
        let _writer = self.writer.lock().await;
        let _pending = self.begin_pending();

        tracing::info!(email = %email, "Attempting sign in");
        let Some((identity, organization)) = self.backend.authenticate(email, secret).await else {
            tracing::info!(email = %email, "Sign in rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let mut state = write_state(&self.state);
        state.identity = Some(identity.clone());
        state.organization = Some(organization);
        tracing::info!(user_id = %identity.id, role = %identity.role, "Signed in");
        Ok(identity)
    }

    /// Create a new organization and sign in as a new identity
    ///
    /// The organization starts on the requested plan, or the lowest tier.
    /// Readers never see it on any other plan.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Identity {
        let _writer = self.writer.lock().await;
        let _pending = self.begin_pending();

        tracing::info!(
            organization = %request.organization_name,
            user = %request.display_name,
            role = %request.role,
            "Attempting sign up"
        );
        let (identity, organization) = self.backend.register(request).await;

        let mut state = write_state(&self.state);
        state.identity = Some(identity.clone());
        state.organization = Some(organization);
        identity
    }

    /// Clear identity and organization. Safe to call when signed out.
    pub async fn sign_out(&self) {
        let _writer = self.writer.lock().await;
        let mut state = write_state(&self.state);
        if let Some(identity) = state.identity.take() {
            tracing::info!(user_id = %identity.id, "Signed out");
        }
        state.organization = None;
    }

    /// Replace the current organization's plan
    ///
    /// Returns the updated organization, or `None` when no organization is
    /// set (in which case nothing changes).
    pub async fn update_organization_plan(&self, plan: Plan) -> Option<Organization> {
        let _writer = self.writer.lock().await;
        let mut state = write_state(&self.state);
        let current = state.organization.as_ref()?;
        let updated = current.with_plan(plan);
        tracing::info!(
            organization = %updated.name,
            plan = %updated.plan.name,
            "Organization plan updated"
        );
        state.organization = Some(updated.clone());
        Some(updated)
    }
}
