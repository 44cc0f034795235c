use crate::config::ActionCenterConfig;
use crate::priority::{AspectStatistics, PriorityScorer, RankBy, Severity};
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_OWNER: &str = "Product Owner";

const BUILTIN_OWNERS: &[(&str, &str)] = &[
    ("PRICE", "Sales & Pricing"),
    ("GENERAL", "Customer Care"),
    ("BATTERY", "Hardware"),
    ("CAMERA", "R&D Camera"),
    ("PERFORMANCE", "Performance Eng"),
    ("DESIGN", "Product Design"),
    ("FEATURES", "Product Team"),
    ("SCREEN", "Display Team"),
    ("STORAGE", "Hardware"),
    ("SER&ACC", "Service & Accessories"),
];

/// Aspect → owning team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerMap {
    owners: BTreeMap<String, String>,
}

impl Default for OwnerMap {
    fn default() -> Self {
        Self {
            owners: BUILTIN_OWNERS
                .iter()
                .map(|(aspect, owner)| ((*aspect).to_string(), (*owner).to_string()))
                .collect(),
        }
    }
}

impl OwnerMap {
    /// Built-in owners with `overrides` layered on top.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut map = Self::default();
        for (aspect, owner) in overrides {
            map.owners
                .insert(aspect.to_ascii_uppercase(), owner.clone());
        }
        map
    }

    pub fn owner_of(&self, aspect: &str) -> &str {
        self.owners
            .get(aspect)
            .map_or(DEFAULT_OWNER, String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Focus {
    /// Fix what customers complain about
    Mitigate,
    /// Build on what customers praise
    Amplify,
}

impl Focus {
    pub const fn next_step(self) -> &'static str {
        match self {
            Self::Mitigate => {
                "Investigate root causes, reply to affected customers and ship a fix plan."
            }
            Self::Amplify => "Reuse the positive feedback in marketing and upsell campaigns.",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mitigate => "mitigate",
            Self::Amplify => "amplify",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrgentAspect {
    #[serde(flatten)]
    pub stats: AspectStatistics,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionItem {
    pub aspect: String,
    pub owner: String,
    pub focus: Focus,
    pub severity: Severity,
    pub mentions: usize,
    pub next_step: String,
}

/// Effective filters after corpus-derived defaults were applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedFilters {
    pub min_mentions: usize,
    pub top_n: usize,
}

impl ResolvedFilters {
    pub fn resolve(stats: &BTreeMap<String, AspectStatistics>, config: ActionCenterConfig) -> Self {
        Self {
            min_mentions: config
                .min_mentions
                .unwrap_or_else(|| default_min_mentions(stats)),
            top_n: config.top_n.unwrap_or_else(|| default_top_n(stats)),
        }
    }
}

/// `max(1, max_mentions / 5)`.
pub fn default_min_mentions(stats: &BTreeMap<String, AspectStatistics>) -> usize {
    let max_mentions = stats.values().map(|s| s.mentions).max().unwrap_or(0).max(1);
    (max_mentions / 5).max(1)
}

/// Between 1 and 5 depending on how many distinct aspects the corpus has.
pub fn default_top_n(stats: &BTreeMap<String, AspectStatistics>) -> usize {
    let distinct = stats.len().max(1);
    let lower = if distinct < 3 { 1 } else { 3 };
    let upper = lower.max(distinct.min(8));
    upper.min(5)
}

/// Prioritized view over corpus statistics: what to fix, what to promote, who owns it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionCenter {
    pub filters: ResolvedFilters,
    pub urgent: Vec<UrgentAspect>,
    pub opportunities: Vec<AspectStatistics>,
    pub plan: Vec<ActionItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_complaint: Option<String>,
}

impl ActionCenter {
    pub fn build(
        stats: &BTreeMap<String, AspectStatistics>,
        config: ActionCenterConfig,
        owners: &OwnerMap,
    ) -> Self {
        let filters = ResolvedFilters::resolve(stats, config);

        let urgent: Vec<UrgentAspect> = PriorityScorer::rank(
            stats,
            filters.min_mentions,
            filters.top_n,
            RankBy::Priority,
        )
        .into_iter()
        .map(|stats| UrgentAspect {
            severity: stats.severity(),
            stats,
        })
        .collect();

        let opportunities = PriorityScorer::rank(
            stats,
            filters.min_mentions,
            filters.top_n,
            RankBy::Opportunity,
        );

        let mitigate = urgent.iter().map(|u| {
            action_item(&u.stats, Focus::Mitigate, u.severity, owners)
        });
        let amplify = opportunities
            .iter()
            .filter(|s| s.pos > 0)
            .map(|s| action_item(s, Focus::Amplify, Severity::Medium, owners));
        let plan: Vec<ActionItem> = mitigate.chain(amplify).collect();

        log::debug!(
            "action center: {} urgent, {} opportunities, {} actions (min_mentions={}, top_n={})",
            urgent.len(),
            opportunities.len(),
            plan.len(),
            filters.min_mentions,
            filters.top_n
        );

        Self {
            filters,
            urgent,
            opportunities,
            plan,
            example_complaint: None,
        }
    }

    #[must_use]
    pub fn with_example_complaint(mut self, text: Option<&str>) -> Self {
        self.example_complaint = text.map(ToString::to_string);
        self
    }

    /// Statistics passing `min_mentions`, for the priority CSV.
    pub fn summary(&self, stats: &BTreeMap<String, AspectStatistics>) -> Vec<AspectStatistics> {
        PriorityScorer::filter(stats, self.filters.min_mentions)
    }

    pub fn is_empty(&self) -> bool {
        self.urgent.is_empty() && self.opportunities.is_empty()
    }
}

fn action_item(
    stats: &AspectStatistics,
    focus: Focus,
    severity: Severity,
    owners: &OwnerMap,
) -> ActionItem {
    ActionItem {
        aspect: stats.aspect.clone(),
        owner: owners.owner_of(&stats.aspect).to_string(),
        focus,
        severity,
        mentions: stats.mentions,
        next_step: focus.next_step().to_string(),
    }
}
