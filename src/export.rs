//! Export types for serializing knowledge-base state.
//!
//! A one-way, human-readable snapshot of the store and its justification
//! graph, suitable for JSON dumps. Handles are exported as raw arena slots.

use serde::{Deserialize, Serialize};

use crate::entity::{Justification, Support};
use crate::error::TmsResult;
use crate::kb::KnowledgeBase;

/// Exported `(fact, rule)` justification pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportExport {
    pub fact: usize,
    pub rule: usize,
}

impl From<&Support> for SupportExport {
    fn from(s: &Support) -> Self {
        Self {
            fact: s.fact.index(),
            rule: s.rule.index(),
        }
    }
}

/// Justification state shared by exported facts and rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JustificationExport {
    pub asserted: bool,
    pub supported_by: Vec<SupportExport>,
    pub supports_facts: Vec<usize>,
    pub supports_rules: Vec<usize>,
}

impl From<&Justification> for JustificationExport {
    fn from(j: &Justification) -> Self {
        Self {
            asserted: j.is_asserted(),
            supported_by: j.supported_by().iter().map(SupportExport::from).collect(),
            supports_facts: j.supports_facts().iter().map(|f| f.index()).collect(),
            supports_rules: j.supports_rules().iter().map(|r| r.index()).collect(),
        }
    }
}

/// Exported fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactExport {
    /// Arena slot.
    pub id: usize,
    /// Statement in reader syntax, e.g. `(isa cube block)`.
    pub statement: String,
    #[serde(flatten)]
    pub justification: JustificationExport,
}

/// Exported rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleExport {
    /// Arena slot.
    pub id: usize,
    pub lhs: Vec<String>,
    pub rhs: String,
    #[serde(flatten)]
    pub justification: JustificationExport,
}

/// Snapshot of a whole knowledge base, facts then rules in store order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseExport {
    pub facts: Vec<FactExport>,
    pub rules: Vec<RuleExport>,
}

impl KnowledgeBase {
    /// Build a serializable snapshot of the store.
    pub fn export(&self) -> KnowledgeBaseExport {
        let facts = self
            .facts()
            .map(|(id, fact)| FactExport {
                id: id.index(),
                statement: fact.statement().to_string(),
                justification: fact.justification().into(),
            })
            .collect();
        let rules = self
            .rules()
            .map(|(id, rule)| RuleExport {
                id: id.index(),
                lhs: rule.lhs().iter().map(ToString::to_string).collect(),
                rhs: rule.rhs().to_string(),
                justification: rule.justification().into(),
            })
            .collect();
        KnowledgeBaseExport { facts, rules }
    }

    /// Snapshot as pretty-printed JSON.
    pub fn export_json(&self) -> TmsResult<String> {
        Ok(serde_json::to_string_pretty(&self.export())?)
    }
}
