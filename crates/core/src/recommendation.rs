//! Recommendation vocabulary: entity kinds, action kinds, lifecycle statuses,
//! and the [`EntityRef`] tagged union used for protection inheritance.

use crate::error::CoreError;
use crate::vocab::define_text_enum;

define_text_enum! {
    /// Kind of ad-platform object a recommendation targets.
    EntityType {
        Campaign => "campaign",
        AdSet => "adset",
        Ad => "ad",
    }
}

define_text_enum! {
    /// Proposed action. Only the first four are executable; the rest are
    /// informational and always skipped by the apply pipeline.
    ActionType {
        Pause => "pause",
        Resume => "resume",
        IncreaseBudget => "increase_budget",
        DecreaseBudget => "decrease_budget",
        RefreshCreative => "refresh_creative",
        ReviewTargeting => "review_targeting",
        Investigate => "investigate",
    }
}

define_text_enum! {
    /// Recommendation lifecycle.
    ///
    /// `queued -> approved -> applied | failed`, with `false_positive` as a
    /// terminal human override reachable from any non-applied status.
    RecommendationStatus {
        Queued => "queued",
        Approved => "approved",
        Applied => "applied",
        Failed => "failed",
        FalsePositive => "false_positive",
    }
}

define_text_enum! {
    /// Severity assigned by the detection rule.
    Severity {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

/// The four action kinds the executor knows how to perform.
pub const EXECUTABLE_ACTIONS: &[ActionType] = &[
    ActionType::Pause,
    ActionType::Resume,
    ActionType::IncreaseBudget,
    ActionType::DecreaseBudget,
];

impl ActionType {
    /// Whether the executor can perform this action.
    pub fn is_executable(self) -> bool {
        EXECUTABLE_ACTIONS.contains(&self)
    }
}

/// Database literals of every executable action, for `= ANY($n)` filters.
pub fn executable_action_literals() -> Vec<String> {
    EXECUTABLE_ACTIONS
        .iter()
        .map(|a| a.as_str().to_string())
        .collect()
}

/// Whether a stored `action_type` literal is one of the executable kinds.
///
/// Unknown literals are treated as informational.
pub fn is_executable_literal(action_type: &str) -> bool {
    ActionType::parse(action_type).is_some_and(ActionType::is_executable)
}

// ---------------------------------------------------------------------------
// EntityRef
// ---------------------------------------------------------------------------

/// A targeted ad-platform entity together with its parent campaign.
///
/// Ad sets and ads carry the parent campaign id (when known) so that
/// protection is inherited downward with a single match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRef {
    Campaign { id: String },
    AdSet { id: String, campaign_id: Option<String> },
    Ad { id: String, campaign_id: Option<String> },
}

impl EntityRef {
    /// Build a reference from the stored columns.
    pub fn from_parts(
        entity_type: &str,
        entity_id: &str,
        campaign_id: Option<&str>,
    ) -> Result<Self, CoreError> {
        let kind = EntityType::parse(entity_type).ok_or_else(|| {
            CoreError::Validation(format!("Unknown entity type: '{entity_type}'"))
        })?;
        let id = entity_id.to_string();
        let campaign_id = campaign_id.map(str::to_string);
        Ok(match kind {
            EntityType::Campaign => EntityRef::Campaign { id },
            EntityType::AdSet => EntityRef::AdSet { id, campaign_id },
            EntityType::Ad => EntityRef::Ad { id, campaign_id },
        })
    }

    pub fn entity_type(&self) -> EntityType {
        match self {
            EntityRef::Campaign { .. } => EntityType::Campaign,
            EntityRef::AdSet { .. } => EntityType::AdSet,
            EntityRef::Ad { .. } => EntityType::Ad,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            EntityRef::Campaign { id } | EntityRef::AdSet { id, .. } | EntityRef::Ad { id, .. } => {
                id
            }
        }
    }

    /// Whether this entity type carries its own budget on the platform.
    pub fn has_budget(&self) -> bool {
        !matches!(self, EntityRef::Ad { .. })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
