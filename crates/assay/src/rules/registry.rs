//! Rule name to constructor lookup.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::{RuleConfig, RuleParameters};
use crate::error::RuleError;

use super::{ApprovalSequence, ConditionalPresence, Rule, SegregationOfDuties, TitleBasedApproval};

/// Builds a rule from its configured parameters.
pub type RuleFactory = fn(&RuleParameters) -> Result<Box<dyn Rule>, RuleError>;

/// The built-in rule kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    SegregationOfDuties,
    ApprovalSequence,
    TitleBasedApproval,
    #[serde(rename = "third_party_risk_validation", alias = "conditional_presence")]
    ConditionalPresence,
}

impl RuleKind {
    pub const ALL: [RuleKind; 4] = [
        RuleKind::SegregationOfDuties,
        RuleKind::ApprovalSequence,
        RuleKind::TitleBasedApproval,
        RuleKind::ConditionalPresence,
    ];

    /// Configuration name of the rule.
    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::SegregationOfDuties => SegregationOfDuties::NAME,
            RuleKind::ApprovalSequence => ApprovalSequence::NAME,
            RuleKind::TitleBasedApproval => TitleBasedApproval::NAME,
            RuleKind::ConditionalPresence => ConditionalPresence::NAME,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        if name == ConditionalPresence::ALIAS {
            return Some(RuleKind::ConditionalPresence);
        }
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Short description for listings.
    pub fn description(&self) -> &'static str {
        match self {
            RuleKind::SegregationOfDuties => "Submitter must differ from every approver",
            RuleKind::ApprovalSequence => "Dates must not decrease in the configured order",
            RuleKind::TitleBasedApproval => "Approver must hold an allowed job title",
            RuleKind::ConditionalPresence => {
                "Status must be N/A exactly when the population is empty"
            }
        }
    }

    pub fn build(&self, parameters: &RuleParameters) -> Result<Box<dyn Rule>, RuleError> {
        (self.factory())(parameters)
    }

    fn factory(&self) -> RuleFactory {
        match self {
            RuleKind::SegregationOfDuties => build_segregation,
            RuleKind::ApprovalSequence => build_sequence,
            RuleKind::TitleBasedApproval => build_title,
            RuleKind::ConditionalPresence => build_conditional,
        }
    }
}

fn build_segregation(parameters: &RuleParameters) -> Result<Box<dyn Rule>, RuleError> {
    Ok(Box::new(SegregationOfDuties::from_parameters(parameters)?))
}

fn build_sequence(parameters: &RuleParameters) -> Result<Box<dyn Rule>, RuleError> {
    Ok(Box::new(ApprovalSequence::from_parameters(parameters)?))
}

fn build_title(parameters: &RuleParameters) -> Result<Box<dyn Rule>, RuleError> {
    Ok(Box::new(TitleBasedApproval::from_parameters(parameters)?))
}

fn build_conditional(parameters: &RuleParameters) -> Result<Box<dyn Rule>, RuleError> {
    Ok(Box::new(ConditionalPresence::from_parameters(parameters)?))
}

/// Maps rule names to factories.
///
/// [`RuleRegistry::builtin`] knows the four built-in rules; callers can
/// [`register`](RuleRegistry::register) more under new names.
#[derive(Clone)]
pub struct RuleRegistry {
    factories: IndexMap<String, RuleFactory>,
}

impl RuleRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            factories: IndexMap::new(),
        }
    }

    /// Registry with every built-in rule.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for kind in RuleKind::ALL {
            registry.register(kind.name(), kind.factory());
        }
        registry.register(
            ConditionalPresence::ALIAS,
            RuleKind::ConditionalPresence.factory(),
        );
        registry
    }

    /// Add or replace a rule under `name`.
    pub fn register(&mut self, name: impl Into<String>, factory: RuleFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(|k| k.as_str())
    }

    /// Build the rule a configuration entry names.
    pub fn resolve(&self, config: &RuleConfig) -> Result<Box<dyn Rule>, RuleError> {
        let factory = self
            .factories
            .get(&config.rule_name)
            .ok_or_else(|| RuleError::UnknownRule(config.rule_name.clone()))?;
        factory(&config.parameters)
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
