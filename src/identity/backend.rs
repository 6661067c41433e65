//! Credential and organization backends
//!
//! The store only talks to [`IdentityBackend`], so a real account service can
//! replace the mock table without touching the guard or the HTTP layer.

use super::{find_plan, lowest_tier_plan, Identity, Organization, Plan, Role};
use async_trait::async_trait;
use std::time::Duration;

/// Sign-up form contents
#[derive(Debug, Clone)]
pub struct SignUpRequest {
    pub organization_name: String,
    pub display_name: String,
    pub email: String,
    pub secret: String,
    pub role: Role,
    /// Plan picked on the pricing page; the lowest tier when absent
    pub plan: Option<Plan>,
}

/// Resolves credentials and creates accounts
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    /// Look up the identity for an email/secret pair
    async fn authenticate(&self, email: &str, secret: &str) -> Option<(Identity, Organization)>;

    /// Create a new organization and identity
    async fn register(&self, request: &SignUpRequest) -> (Identity, Organization);
}

struct MockAccount {
    user_id: &'static str,
    display_name: &'static str,
    email: &'static str,
    role: Role,
}

const MOCK_SECRET: &str = "password";
const MOCK_ORG_ID: &str = "org123";
const MOCK_ORG_NAME: &str = "Springfield University";
const MOCK_ORG_PLAN: &str = "premium";

const MOCK_ACCOUNTS: &[MockAccount] = &[
    MockAccount {
        user_id: "userAdmin",
        display_name: "Admin User",
        email: "admin@example.com",
        role: Role::Admin,
    },
    MockAccount {
        user_id: "userFaculty",
        display_name: "Dr. Faculty",
        email: "faculty@example.com",
        role: Role::Faculty,
    },
    MockAccount {
        user_id: "userStudent",
        display_name: "Student User",
        email: "student@example.com",
        role: Role::Student,
    },
];

/// Fixed in-memory account table
///
/// Every account shares the secret `password` and belongs to
/// Springfield University on the premium plan. Registration always
/// succeeds and performs no uniqueness checks.
#[derive(Debug, Clone, Default)]
pub struct MockIdentityBackend {
    latency: Duration,
}

impl MockIdentityBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call, imitating a network round trip
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn mock_organization() -> Organization {
        Organization {
            id: MOCK_ORG_ID.to_string(),
            name: MOCK_ORG_NAME.to_string(),
            plan: find_plan(MOCK_ORG_PLAN).unwrap_or_else(lowest_tier_plan),
        }
    }
}

#[async_trait]
impl IdentityBackend for MockIdentityBackend {
    async fn authenticate(&self, email: &str, secret: &str) -> Option<(Identity, Organization)> {
        self.simulate_latency().await;

        if secret != MOCK_SECRET {
            return None;
        }
        let account = MOCK_ACCOUNTS.iter().find(|a| a.email == email)?;
        let organization = Self::mock_organization();
        let identity = Identity {
            id: account.user_id.to_string(),
            display_name: account.display_name.to_string(),
            email: account.email.to_string(),
            role: account.role,
            organization_id: organization.id.clone(),
        };
        Some((identity, organization))
    }

    async fn register(&self, request: &SignUpRequest) -> (Identity, Organization) {
        self.simulate_latency().await;

        let plan = request.plan.clone().unwrap_or_else(lowest_tier_plan);
        let organization = Organization {
            id: format!("org-{}", uuid::Uuid::new_v4()),
            name: request.organization_name.clone(),
            plan,
        };
        let identity = Identity {
            id: format!("user-{}", uuid::Uuid::new_v4()),
            display_name: request.display_name.clone(),
            email: request.email.clone(),
            role: request.role,
            organization_id: organization.id.clone(),
        };
        (identity, organization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_known_accounts_authenticate() {
        let backend = MockIdentityBackend::new();
        for (email, role) in [
            ("admin@example.com", Role::Admin),
            ("faculty@example.com", Role::Faculty),
            ("student@example.com", Role::Student),
        ] {
            let (identity, org) = backend.authenticate(email, "password").await.unwrap();
            assert_eq!(identity.role, role);
            assert_eq!(identity.organization_id, "org123");
            assert_eq!(org.plan.id, "premium");
        }
    }

    #[tokio::test]
    async fn test_wrong_secret_rejected() {
        let backend = MockIdentityBackend::new();
        assert!(backend.authenticate("admin@example.com", "hunter2").await.is_none());
        assert!(backend.authenticate("nobody@example.com", "password").await.is_none());
    }

    #[tokio::test]
    async fn test_register_creates_fresh_ids() {
        let backend = MockIdentityBackend::new();
        let request = SignUpRequest {
            organization_name: "Shelbyville College".to_string(),
            display_name: "Pat".to_string(),
            email: "pat@example.com".to_string(),
            secret: "anything".to_string(),
            role: Role::Faculty,
            plan: None,
        };
        let (first, first_org) = backend.register(&request).await;
        let (second, _) = backend.register(&request).await;

        assert!(first.id.starts_with("user-"));
        assert!(first_org.id.starts_with("org-"));
        assert_eq!(first.organization_id, first_org.id);
        assert_ne!(first.id, second.id);
        assert_eq!(first_org.plan.id, "basic");

        let chosen = SignUpRequest {
            plan: find_plan("advanced"),
            ..request
        };
        let (_, org) = backend.register(&chosen).await;
        assert_eq!(org.plan.id, "advanced");
    }
}
