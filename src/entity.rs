//! Facts, rules, and their justification records.
//!
//! Stored entities live in the [`KnowledgeBase`](crate::kb::KnowledgeBase)
//! arena and refer to each other through [`FactId`]/[`RuleId`] handles.
//! Every entity carries a [`Justification`]: whether a caller asserted it,
//! the `(fact, rule)` pairs it was derived from, and the back references
//! to the entities it helped derive.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::term::Statement;

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Stable handle of a stored fact. Never reused after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct FactId(usize);

/// Stable handle of a stored rule. Never reused after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct RuleId(usize);

impl FactId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Arena slot of this fact.
    pub fn index(self) -> usize {
        self.0
    }
}

impl RuleId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Arena slot of this rule.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fact:{}", self.0)
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule:{}", self.0)
    }
}

/// Handle of either kind of stored entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryId {
    Fact(FactId),
    Rule(RuleId),
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryId::Fact(id) => write!(f, "{id}"),
            EntryId::Rule(id) => write!(f, "{id}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Justification
// ---------------------------------------------------------------------------

/// "Derived from `fact` via `rule`."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Support {
    pub fact: FactId,
    pub rule: RuleId,
}

impl Support {
    pub fn new(fact: FactId, rule: RuleId) -> Self {
        Self { fact, rule }
    }

    /// True if `id` is either member of this pair.
    pub fn names(&self, id: EntryId) -> bool {
        match id {
            EntryId::Fact(f) => self.fact == f,
            EntryId::Rule(r) => self.rule == r,
        }
    }
}

/// Truth-maintenance record shared by facts and rules.
#[derive(Debug, Clone, Default)]
pub struct Justification {
    asserted: bool,
    supported_by: Vec<Support>,
    supports_facts: Vec<FactId>,
    supports_rules: Vec<RuleId>,
}

impl Justification {
    fn asserted() -> Self {
        Self {
            asserted: true,
            ..Default::default()
        }
    }

    fn derived(support: Support) -> Self {
        Self {
            supported_by: vec![support],
            ..Default::default()
        }
    }

    pub fn is_asserted(&self) -> bool {
        self.asserted
    }

    /// The `(fact, rule)` pairs this entity was derived from.
    pub fn supported_by(&self) -> &[Support] {
        &self.supported_by
    }

    /// Facts this entity helped derive.
    pub fn supports_facts(&self) -> &[FactId] {
        &self.supports_facts
    }

    /// Rules this entity helped derive.
    pub fn supports_rules(&self) -> &[RuleId] {
        &self.supports_rules
    }

    pub fn is_supported(&self) -> bool {
        !self.supported_by.is_empty()
    }

    /// Neither asserted nor supported: must leave the store.
    pub fn is_unfounded(&self) -> bool {
        !self.asserted && self.supported_by.is_empty()
    }

    pub(crate) fn mark_asserted(&mut self) {
        self.asserted = true;
    }

    /// Append a support pair; returns `false` if it was already recorded.
    pub(crate) fn add_support(&mut self, support: Support) -> bool {
        if self.supported_by.contains(&support) {
            return false;
        }
        self.supported_by.push(support);
        true
    }

    /// Drop every pair naming `id`, returning the dropped pairs.
    pub(crate) fn remove_supports_naming(&mut self, id: EntryId) -> Vec<Support> {
        let (dropped, kept) = self
            .supported_by
            .drain(..)
            .partition::<Vec<_>, _>(|s| s.names(id));
        self.supported_by = kept;
        dropped
    }

    /// True if some remaining pair names `id`.
    pub(crate) fn is_supported_through(&self, id: EntryId) -> bool {
        self.supported_by.iter().any(|s| s.names(id))
    }

    pub(crate) fn link_fact(&mut self, id: FactId) {
        if !self.supports_facts.contains(&id) {
            self.supports_facts.push(id);
        }
    }

    pub(crate) fn link_rule(&mut self, id: RuleId) {
        if !self.supports_rules.contains(&id) {
            self.supports_rules.push(id);
        }
    }

    pub(crate) fn unlink(&mut self, id: EntryId) {
        match id {
            EntryId::Fact(f) => self.supports_facts.retain(|x| *x != f),
            EntryId::Rule(r) => self.supports_rules.retain(|x| *x != r),
        }
    }

    pub(crate) fn links(&self, id: EntryId) -> bool {
        match id {
            EntryId::Fact(f) => self.supports_facts.contains(&f),
            EntryId::Rule(r) => self.supports_rules.contains(&r),
        }
    }

    /// Move the dependents out, leaving the lists empty.
    pub(crate) fn take_dependents(&mut self) -> (Vec<FactId>, Vec<RuleId>) {
        (
            std::mem::take(&mut self.supports_facts),
            std::mem::take(&mut self.supports_rules),
        )
    }
}

// ---------------------------------------------------------------------------
// Fact
// ---------------------------------------------------------------------------

/// A ground statement held in the knowledge base.
///
/// Equality compares statements only, never justification state.
#[derive(Debug, Clone)]
pub struct Fact {
    statement: Statement,
    justification: Justification,
}

impl Fact {
    /// A fact as asserted by a caller.
    pub fn new(statement: Statement) -> Self {
        Self {
            statement,
            justification: Justification::asserted(),
        }
    }

    /// A fact produced by inference, justified by one pair.
    pub(crate) fn derived(statement: Statement, support: Support) -> Self {
        Self {
            statement,
            justification: Justification::derived(support),
        }
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn justification(&self) -> &Justification {
        &self.justification
    }

    pub(crate) fn justification_mut(&mut self) -> &mut Justification {
        &mut self.justification
    }

    pub fn is_asserted(&self) -> bool {
        self.justification.is_asserted()
    }

    pub fn supported_by(&self) -> &[Support] {
        self.justification.supported_by()
    }
}

impl PartialEq for Fact {
    fn eq(&self, other: &Self) -> bool {
        self.statement == other.statement
    }
}

impl Eq for Fact {}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.statement)
    }
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// An implication: ordered antecedents and a consequent template.
///
/// Antecedents are consumed strictly left to right during chaining.
/// Equality compares `(lhs, rhs)` content only.
#[derive(Debug, Clone)]
pub struct Rule {
    lhs: Vec<Statement>,
    rhs: Statement,
    justification: Justification,
}

impl Rule {
    /// A rule as asserted by a caller.
    pub fn new(lhs: Vec<Statement>, rhs: Statement) -> Self {
        Self {
            lhs,
            rhs,
            justification: Justification::asserted(),
        }
    }

    pub(crate) fn derived(lhs: Vec<Statement>, rhs: Statement, support: Support) -> Self {
        Self {
            lhs,
            rhs,
            justification: Justification::derived(support),
        }
    }

    pub fn lhs(&self) -> &[Statement] {
        &self.lhs
    }

    pub fn rhs(&self) -> &Statement {
        &self.rhs
    }

    pub fn justification(&self) -> &Justification {
        &self.justification
    }

    pub(crate) fn justification_mut(&mut self) -> &mut Justification {
        &mut self.justification
    }

    pub fn is_asserted(&self) -> bool {
        self.justification.is_asserted()
    }

    pub fn supported_by(&self) -> &[Support] {
        self.justification.supported_by()
    }

    /// Dedupe key: the rule's content.
    pub(crate) fn key(&self) -> RuleKey {
        RuleKey {
            lhs: self.lhs.clone(),
            rhs: self.rhs.clone(),
        }
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.lhs == other.lhs && self.rhs == other.rhs
    }
}

impl Eq for Rule {}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, s) in self.lhs.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{s}")?;
        }
        write!(f, ") -> {}", self.rhs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct RuleKey {
    lhs: Vec<Statement>,
    rhs: Statement,
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// A fact or a rule, as handed to `assert`, `retract` and `ask`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Fact(Fact),
    Rule(Rule),
}

impl Entry {
    /// Only facts are well-formed queries.
    pub fn is_query(&self) -> bool {
        matches!(self, Entry::Fact(_))
    }
}

impl From<Fact> for Entry {
    fn from(fact: Fact) -> Self {
        Entry::Fact(fact)
    }
}

impl From<Rule> for Entry {
    fn from(rule: Rule) -> Self {
        Entry::Rule(rule)
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Fact(fact) => write!(f, "fact: {fact}"),
            Entry::Rule(rule) => write!(f, "rule: {rule}"),
        }
    }
}
