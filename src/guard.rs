//! Role-based access guard
//!
//! Every navigation asks [`authorize`] once. The guard never renders a view
//! to an identity whose role is outside the view's allowed set.

use crate::identity::{Identity, Role, SessionSnapshot};
use serde::{Deserialize, Serialize};

/// Navigable views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Landing,
    Auth,
    Pricing,
    PricingPlans,
    PaymentConfirmation,
    Student,
    Faculty,
    Admin,
    Chatbot,
}

const EVERY_ROLE: &[Role] = &[Role::Student, Role::Faculty, Role::Admin];

impl View {
    pub const ALL: [View; 9] = [
        View::Landing,
        View::Auth,
        View::Pricing,
        View::PricingPlans,
        View::PaymentConfirmation,
        View::Student,
        View::Faculty,
        View::Admin,
        View::Chatbot,
    ];

    pub fn path(self) -> &'static str {
        match self {
            View::Landing => "/",
            View::Auth => "/auth",
            View::Pricing => "/pricing",
            View::PricingPlans => "/pricing/plans",
            View::PaymentConfirmation => "/payment-confirmation",
            View::Student => "/student",
            View::Faculty => "/faculty",
            View::Admin => "/admin",
            View::Chatbot => "/chatbot",
        }
    }

    /// Resolve a path; query strings and trailing slashes are ignored
    pub fn from_path(path: &str) -> Option<View> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        View::ALL.into_iter().find(|view| view.path() == normalized)
    }

    /// Roles allowed to see this view; `None` means public
    pub fn allowed_roles(self) -> Option<&'static [Role]> {
        match self {
            View::Landing
            | View::Auth
            | View::Pricing
            | View::PricingPlans
            | View::PaymentConfirmation => None,
            View::Student | View::Chatbot => Some(EVERY_ROLE),
            View::Faculty => Some(&[Role::Faculty, Role::Admin]),
            View::Admin => Some(&[Role::Admin]),
        }
    }

    pub fn permits(self, role: Role) -> bool {
        self.allowed_roles()
            .map_or(true, |roles| roles.contains(&role))
    }
}

/// Where each role lands by default
pub fn default_view(role: Role) -> View {
    match role {
        Role::Student => View::Student,
        Role::Faculty => View::Faculty,
        Role::Admin => View::Admin,
    }
}

/// Outcome of a navigation check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Access {
    /// Show the requested view
    Render { view: View },
    /// The store is mid sign-in; show a loading indicator and decide later
    Loading,
    /// Not signed in; go to sign-in and come back afterwards
    SignIn { return_to: View },
    /// Signed in with the wrong role; go to the role's default view
    Redirect { to: View },
}

/// Decide whether the current session may see `view`
///
/// Public views render at once. Protected views wait out a pending sign-in.
pub fn authorize(view: View, session: &SessionSnapshot) -> Access {
    let Some(roles) = view.allowed_roles() else {
        return Access::Render { view };
    };

    if session.loading {
        return Access::Loading;
    }

    let Some(identity) = &session.identity else {
        tracing::debug!(view = ?view, "Not authenticated, redirecting to sign in");
        return Access::SignIn { return_to: view };
    };

    if roles.contains(&identity.role) {
        Access::Render { view }
    } else {
        let to = default_view(identity.role);
        tracing::debug!(
            role = %identity.role,
            view = ?view,
            redirect = ?to,
            "Role mismatch, redirecting to default view"
        );
        Access::Redirect { to }
    }
}

/// Resolve a raw path and authorize it; unknown paths go to the landing page
pub fn navigate(path: &str, session: &SessionSnapshot) -> Access {
    match View::from_path(path) {
        Some(view) => authorize(view, session),
        None => Access::Redirect { to: View::Landing },
    }
}

/// Where to go right after signing in
pub fn after_sign_in(return_to: Option<View>, identity: &Identity) -> View {
    match return_to {
        Some(view) if view != View::Auth && view.permits(identity.role) => view,
        _ => default_view(identity.role),
    }
}
