//! API request and response types

use crate::chat::ChatSnapshot;
use crate::guard::{Access, View};
use crate::identity::{Identity, Organization, Plan, Role};
use crate::wellness::{FacultyNote, FlaggedStudentSummary, MoodRating, RosterEntry};
use serde::{Deserialize, Serialize};

/// Request to sign in
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub secret: String,
    /// Path the user was heading to before being sent to sign in
    #[serde(default)]
    pub return_to: Option<String>,
}

/// Request to register a new organization and account
#[derive(Debug, Deserialize)]
pub struct SignUpBody {
    pub organization_name: String,
    pub display_name: String,
    pub email: String,
    pub secret: String,
    pub role: Role,
    /// Plan picked on the pricing page before signing up
    #[serde(default)]
    pub plan_id: Option<String>,
}

/// Response after a successful sign-in or sign-up
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub identity: Identity,
    pub organization: Option<Organization>,
    /// Path to navigate to next
    pub redirect: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct NavigateQuery {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct NavigateResponse {
    #[serde(flatten)]
    pub access: Access,
    /// Path the client should end up on; absent while loading
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<&'static str>,
}

impl From<Access> for NavigateResponse {
    fn from(access: Access) -> Self {
        let location = match access {
            Access::Render { view } | Access::Redirect { to: view } => Some(view.path()),
            Access::SignIn { .. } => Some(View::Auth.path()),
            Access::Loading => None,
        };
        Self { access, location }
    }
}

/// A plan as listed on the pricing page
#[derive(Debug, Serialize)]
pub struct PlanListing {
    #[serde(flatten)]
    pub plan: Plan,
    pub feature_labels: Vec<&'static str>,
}

impl From<Plan> for PlanListing {
    fn from(plan: Plan) -> Self {
        let feature_labels = plan.features.iter().map(|f| f.label()).collect();
        Self {
            plan,
            feature_labels,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionRequest {
    pub plan_id: String,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub organization: Organization,
    pub redirect: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct MoodRequest {
    pub rating: MoodRating,
    #[serde(default)]
    pub journal: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FlaggedResponse {
    pub students: Vec<FlaggedStudentSummary>,
}

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub note: FacultyNote,
}

/// Admin panel contents
#[derive(Debug, Serialize)]
pub struct AdminOverview {
    pub organization: Option<Organization>,
    pub plans: Vec<Plan>,
    pub members: Vec<RosterEntry>,
}

/// Chat widget contents
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    #[serde(flatten)]
    pub chat: ChatSnapshot,
    pub suggestions: Vec<&'static str>,
}

impl From<ChatSnapshot> for ChatResponse {
    fn from(chat: ChatSnapshot) -> Self {
        Self {
            chat,
            suggestions: crate::wellness::fixtures::CHAT_SUGGESTIONS.to_vec(),
        }
    }
}

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

/// Response for actions with nothing else to report
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Where the client should go instead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<&'static str>,
    /// Where to return after signing in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_to: Option<&'static str>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            redirect: None,
            return_to: None,
        }
    }
}
