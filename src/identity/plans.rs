//! Subscription plan catalog
//!
//! Plans are immutable catalog entries. Feature flags are modeled but not
//! enforced anywhere.

use serde::{Deserialize, Serialize};

/// Capability nominally granted by a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanFeature {
    BasicAnalytics,
    MoodTracking,
    MoodTimeline,
    WellnessPoints,
    BasicNudges,
    AdvancedNudges,
    SetuAiChatbot,
    FacultyDashboard,
    FacultyAdvancedInsights,
    AdminPanel,
    ExportReports,
    PrioritySupport,
}

impl PlanFeature {
    /// Human-readable label, e.g. "Mood Timeline"
    pub fn label(self) -> &'static str {
        match self {
            PlanFeature::BasicAnalytics => "Basic Analytics",
            PlanFeature::MoodTracking => "Mood Tracking",
            PlanFeature::MoodTimeline => "Mood Timeline",
            PlanFeature::WellnessPoints => "Wellness Points",
            PlanFeature::BasicNudges => "Basic Nudges",
            PlanFeature::AdvancedNudges => "Advanced Nudges",
            PlanFeature::SetuAiChatbot => "Setu Ai Chatbot",
            PlanFeature::FacultyDashboard => "Faculty Dashboard",
            PlanFeature::FacultyAdvancedInsights => "Faculty Advanced Insights",
            PlanFeature::AdminPanel => "Admin Panel",
            PlanFeature::ExportReports => "Export Reports",
            PlanFeature::PrioritySupport => "Priority Support",
        }
    }
}

/// A subscription tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    /// Price per student per month, in cents
    pub price_per_unit_cents: u32,
    pub description: String,
    pub features: Vec<PlanFeature>,
    pub highlight: bool,
}

struct PlanDef {
    id: &'static str,
    name: &'static str,
    price_per_unit_cents: u32,
    description: &'static str,
    features: &'static [PlanFeature],
    highlight: bool,
}

impl PlanDef {
    fn to_plan(&self) -> Plan {
        Plan {
            id: self.id.to_string(),
            name: self.name.to_string(),
            price_per_unit_cents: self.price_per_unit_cents,
            description: self.description.to_string(),
            features: self.features.to_vec(),
            highlight: self.highlight,
        }
    }
}

// Ordered lowest tier first.
const CATALOG: &[PlanDef] = &[
    PlanDef {
        id: "basic",
        name: "Basic",
        price_per_unit_cents: 100,
        description: "Essential tools for individual student wellness and basic monitoring.",
        features: &[
            PlanFeature::BasicAnalytics,
            PlanFeature::MoodTracking,
            PlanFeature::WellnessPoints,
            PlanFeature::BasicNudges,
        ],
        highlight: false,
    },
    PlanDef {
        id: "premium",
        name: "Premium",
        price_per_unit_cents: 250,
        description: "Comprehensive features for students and faculty, including AI support.",
        features: &[
            PlanFeature::BasicAnalytics,
            PlanFeature::MoodTracking,
            PlanFeature::MoodTimeline,
            PlanFeature::WellnessPoints,
            PlanFeature::BasicNudges,
            PlanFeature::SetuAiChatbot,
            PlanFeature::FacultyDashboard,
            PlanFeature::AdminPanel,
        ],
        highlight: true,
    },
    PlanDef {
        id: "advanced",
        name: "Advanced",
        price_per_unit_cents: 400,
        description: "Full suite for institutions needing deep insights, customization, and support.",
        features: &[
            PlanFeature::BasicAnalytics,
            PlanFeature::MoodTracking,
            PlanFeature::MoodTimeline,
            PlanFeature::WellnessPoints,
            PlanFeature::AdvancedNudges,
            PlanFeature::SetuAiChatbot,
            PlanFeature::FacultyDashboard,
            PlanFeature::FacultyAdvancedInsights,
            PlanFeature::AdminPanel,
            PlanFeature::ExportReports,
            PlanFeature::PrioritySupport,
        ],
        highlight: false,
    },
];

/// All plans, lowest tier first
pub fn all_plans() -> Vec<Plan> {
    CATALOG.iter().map(PlanDef::to_plan).collect()
}

/// Look up a plan by id
pub fn find_plan(id: &str) -> Option<Plan> {
    CATALOG.iter().find(|def| def.id == id).map(PlanDef::to_plan)
}

/// The plan new organizations start on
pub fn lowest_tier_plan() -> Plan {
    CATALOG[0].to_plan()
}
