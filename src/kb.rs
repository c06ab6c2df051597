//! The knowledge base: an arena of facts and rules with their
//! justification graph.
//!
//! Asserting an entry eagerly forward-chains to a fixpoint: a new fact is
//! tried against every stored rule, a new rule against every stored fact,
//! and everything derived is added the same way. Pending attempts sit on a
//! FIFO agenda that is drained before `assert` returns, so chain length is
//! bounded by memory rather than by the call stack. Equal entries are
//! merged rather than stored twice. Retraction lives in [`crate::tms`].

use std::collections::{HashMap, VecDeque};
use std::fmt;

use crate::entity::{Entry, EntryId, Fact, FactId, Justification, Rule, RuleId, RuleKey};
use crate::error::{TmsError, TmsResult};
use crate::infer::InferenceEngine;
use crate::term::Statement;
use crate::unify::{Answers, unify};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How much the knowledge base reports through `tracing`.
///
/// Warnings about malformed input are always emitted; verbosity only
/// controls the narration of normal operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// No narration (default).
    #[default]
    Silent,
    /// `assert`, `retract` and `ask` calls at info level.
    Actions,
    /// Additionally every add, merge, inference attempt and cascade step
    /// at debug level.
    Inference,
}

impl Verbosity {
    /// Map a repeat count (e.g. `-vv`) to a verbosity.
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => Self::Silent,
            1 => Self::Actions,
            _ => Self::Inference,
        }
    }

    pub fn shows_actions(self) -> bool {
        self >= Self::Actions
    }

    pub fn shows_inference(self) -> bool {
        self >= Self::Inference
    }
}

/// Configuration for a [`KnowledgeBase`].
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBaseConfig {
    pub verbosity: Verbosity,
}

// ---------------------------------------------------------------------------
// Knowledge base
// ---------------------------------------------------------------------------

/// Facts, rules and the support links between them.
///
/// Entities sit in append-only arenas addressed by [`FactId`]/[`RuleId`];
/// a removed entity leaves an empty slot, so slot order is store order.
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    config: KnowledgeBaseConfig,
    engine: InferenceEngine,
    facts: Vec<Option<Fact>>,
    rules: Vec<Option<Rule>>,
    fact_index: HashMap<Statement, FactId>,
    rule_index: HashMap<RuleKey, RuleId>,
    /// Chaining attempts queued by new entities, not yet tried.
    agenda: VecDeque<(FactId, RuleId)>,
}

impl KnowledgeBase {
    pub fn new(config: KnowledgeBaseConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &KnowledgeBaseConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Assert a fact or rule, chaining to a fixpoint.
    ///
    /// Returns the handle of the stored (possibly pre-existing) entity, or
    /// `None` if the entry was rejected: facts must be ground and rules
    /// need at least one antecedent.
    pub fn assert(&mut self, entry: impl Into<Entry>) -> Option<EntryId> {
        let entry = entry.into();
        if self.config.verbosity.shows_actions() {
            tracing::info!(%entry, "asserting");
        }

        match entry {
            Entry::Fact(fact) => {
                if !fact.statement().is_ground() {
                    tracing::warn!(fact = %fact, "refusing to assert a fact with variables");
                    return None;
                }
                let id = self.add_fact(fact);
                self.saturate();
                Some(EntryId::Fact(id))
            }
            Entry::Rule(rule) => {
                if rule.lhs().is_empty() {
                    tracing::warn!(rule = %rule, "refusing to assert a rule without antecedents");
                    return None;
                }
                let id = self.add_rule(rule);
                self.saturate();
                Some(EntryId::Rule(id))
            }
        }
    }

    /// Store a fact or merge it into its equal, returning the canonical
    /// handle. A new fact queues an attempt against every rule stored
    /// before it; [`Self::saturate`] runs them.
    pub(crate) fn add_fact(&mut self, fact: Fact) -> FactId {
        if let Some(&id) = self.fact_index.get(fact.statement()) {
            self.merge(EntryId::Fact(id), fact.justification());
            return id;
        }

        if self.config.verbosity.shows_inference() {
            tracing::debug!(fact = %fact, asserted = fact.is_asserted(), "adding fact");
        }
        let id = FactId::new(self.facts.len());
        self.fact_index.insert(fact.statement().clone(), id);
        self.facts.push(Some(fact));

        let rules: Vec<RuleId> = self.rules().map(|(rid, _)| rid).collect();
        self.agenda.extend(rules.into_iter().map(|rule| (id, rule)));
        id
    }

    /// Store a rule or merge it into its equal. A new rule queues an
    /// attempt against every fact stored before it.
    pub(crate) fn add_rule(&mut self, rule: Rule) -> RuleId {
        let key = rule.key();
        if let Some(&id) = self.rule_index.get(&key) {
            self.merge(EntryId::Rule(id), rule.justification());
            return id;
        }

        if self.config.verbosity.shows_inference() {
            tracing::debug!(rule = %rule, asserted = rule.is_asserted(), "adding rule");
        }
        let id = RuleId::new(self.rules.len());
        self.rule_index.insert(key, id);
        self.rules.push(Some(rule));

        let facts: Vec<FactId> = self.facts().map(|(fid, _)| fid).collect();
        self.agenda.extend(facts.into_iter().map(|fact| (fact, id)));
        id
    }

    /// Try queued `(fact, rule)` pairs in FIFO order until the agenda is
    /// empty. Entities derived along the way queue their own pairs, so
    /// this reaches the fixpoint.
    pub(crate) fn saturate(&mut self) {
        let engine = self.engine;
        while let Some((fact, rule)) = self.agenda.pop_front() {
            engine.step(self, fact, rule);
        }
    }

    /// Fold an incoming duplicate into the stored entity: its supports are
    /// appended, or, if it has none, the stored entity becomes asserted.
    /// Never re-chains.
    fn merge(&mut self, id: EntryId, incoming: &Justification) {
        let verbose = self.config.verbosity.shows_inference();
        let Some(stored) = self.justification_mut(id) else {
            return;
        };

        if incoming.supported_by().is_empty() {
            stored.mark_asserted();
        } else {
            for &support in incoming.supported_by() {
                stored.add_support(support);
            }
        }

        if verbose {
            tracing::debug!(
                entity = %id,
                asserted = stored.is_asserted(),
                supports = stored.supported_by().len(),
                "merged duplicate"
            );
        }
    }

    /// Remove a fact from the arena and index without touching links.
    pub(crate) fn remove_fact(&mut self, id: FactId) -> Option<Fact> {
        let fact = self.facts.get_mut(id.index())?.take()?;
        self.fact_index.remove(fact.statement());
        Some(fact)
    }

    /// Remove a rule from the arena and index without touching links.
    pub(crate) fn remove_rule(&mut self, id: RuleId) -> Option<Rule> {
        let rule = self.rules.get_mut(id.index())?.take()?;
        self.rule_index.remove(&rule.key());
        Some(rule)
    }

    // -----------------------------------------------------------------------
    // Query
    // -----------------------------------------------------------------------

    /// Unify a query fact against every stored fact, in store order.
    ///
    /// A rule is not a valid query: a warning is logged and the answer set
    /// is empty. No match is likewise an empty answer set, not an error.
    pub fn ask(&self, query: impl Into<Entry>) -> Answers {
        let query = query.into();
        if self.config.verbosity.shows_actions() {
            tracing::info!(%query, "asking");
        }

        let mut answers = Answers::new();
        if !query.is_query() {
            tracing::warn!(%query, "invalid ask: only facts can be queried");
            return answers;
        }
        let Entry::Fact(query) = query else {
            return answers;
        };

        for (_, fact) in self.facts() {
            if let Some(bindings) = unify(query.statement(), fact.statement()) {
                answers.add(bindings, vec![fact.statement().clone()]);
            }
        }
        answers
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    pub fn fact(&self, id: FactId) -> Option<&Fact> {
        self.facts.get(id.index())?.as_ref()
    }

    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id.index())?.as_ref()
    }

    pub(crate) fn fact_mut(&mut self, id: FactId) -> Option<&mut Fact> {
        self.facts.get_mut(id.index())?.as_mut()
    }

    pub(crate) fn rule_mut(&mut self, id: RuleId) -> Option<&mut Rule> {
        self.rules.get_mut(id.index())?.as_mut()
    }

    /// Justification record of a stored entity of either kind.
    pub fn justification(&self, id: EntryId) -> Option<&Justification> {
        match id {
            EntryId::Fact(f) => self.fact(f).map(Fact::justification),
            EntryId::Rule(r) => self.rule(r).map(Rule::justification),
        }
    }

    pub(crate) fn justification_mut(&mut self, id: EntryId) -> Option<&mut Justification> {
        match id {
            EntryId::Fact(f) => self.fact_mut(f).map(Fact::justification_mut),
            EntryId::Rule(r) => self.rule_mut(r).map(Rule::justification_mut),
        }
    }

    pub fn find_fact(&self, statement: &Statement) -> Option<FactId> {
        self.fact_index.get(statement).copied()
    }

    pub fn find_rule(&self, rule: &Rule) -> Option<RuleId> {
        self.rule_index.get(&rule.key()).copied()
    }

    /// Handle of the stored entity equal to `entry`.
    pub fn lookup(&self, entry: &Entry) -> Option<EntryId> {
        match entry {
            Entry::Fact(fact) => self.find_fact(fact.statement()).map(EntryId::Fact),
            Entry::Rule(rule) => self.find_rule(rule).map(EntryId::Rule),
        }
    }

    pub fn contains(&self, entry: &Entry) -> bool {
        self.lookup(entry).is_some()
    }

    /// Stored facts in store order.
    pub fn facts(&self) -> impl Iterator<Item = (FactId, &Fact)> {
        self.facts
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|f| (FactId::new(i), f)))
    }

    /// Stored rules in store order.
    pub fn rules(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.rules
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|r| (RuleId::new(i), r)))
    }

    pub fn fact_count(&self) -> usize {
        self.fact_index.len()
    }

    pub fn rule_count(&self) -> usize {
        self.rule_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fact_index.is_empty() && self.rule_index.is_empty()
    }

    // -----------------------------------------------------------------------
    // Invariants
    // -----------------------------------------------------------------------

    /// Check every structural invariant of the store and its justification
    /// graph, returning the first violation found.
    pub fn validate(&self) -> TmsResult<()> {
        if self.fact_index.len() != self.facts().count() {
            return inconsistent("fact index and arena disagree on size".into());
        }
        if self.rule_index.len() != self.rules().count() {
            return inconsistent("rule index and arena disagree on size".into());
        }

        for (id, fact) in self.facts() {
            if self.fact_index.get(fact.statement()) != Some(&id) {
                return inconsistent(format!("{id} {fact} is not indexed under its statement"));
            }
            if !fact.statement().is_ground() {
                return inconsistent(format!("{id} {fact} is not ground"));
            }
            self.validate_links(EntryId::Fact(id), fact.justification())?;
        }

        for (id, rule) in self.rules() {
            if self.rule_index.get(&rule.key()) != Some(&id) {
                return inconsistent(format!("{id} {rule} is not indexed under its content"));
            }
            if rule.lhs().is_empty() {
                return inconsistent(format!("{id} has no antecedents"));
            }
            self.validate_links(EntryId::Rule(id), rule.justification())?;
        }
        Ok(())
    }

    fn validate_links(&self, id: EntryId, just: &Justification) -> TmsResult<()> {
        if just.is_unfounded() {
            return inconsistent(format!("{id} is neither asserted nor supported"));
        }

        for support in just.supported_by() {
            let fact_links = self
                .fact(support.fact)
                .is_some_and(|f| f.justification().links(id));
            let rule_links = self
                .rule(support.rule)
                .is_some_and(|r| r.justification().links(id));
            if !fact_links || !rule_links {
                return inconsistent(format!(
                    "{id} is supported by ({}, {}) without a matching back reference",
                    support.fact, support.rule
                ));
            }
        }

        let dependents = just
            .supports_facts()
            .iter()
            .map(|&f| EntryId::Fact(f))
            .chain(just.supports_rules().iter().map(|&r| EntryId::Rule(r)));
        for dependent in dependents {
            let justified = self
                .justification(dependent)
                .is_some_and(|j| j.is_supported_through(id));
            if !justified {
                return inconsistent(format!(
                    "{id} lists {dependent} as a dependent, but no support pair names it"
                ));
            }
        }
        Ok(())
    }
}

fn inconsistent(message: String) -> TmsResult<()> {
    Err(TmsError::Inconsistent { message })
}

impl fmt::Display for KnowledgeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Knowledge Base:")?;
        for (_, fact) in self.facts() {
            write!(f, "{fact}")?;
            self.fmt_justification(f, fact.justification())?;
            writeln!(f)?;
        }
        for (_, rule) in self.rules() {
            write!(f, "{rule}")?;
            self.fmt_justification(f, rule.justification())?;
            writeln!(f)?;
        }
        Ok(())
    }
}

impl KnowledgeBase {
    fn fmt_justification(&self, f: &mut fmt::Formatter<'_>, just: &Justification) -> fmt::Result {
        if just.supported_by().is_empty() {
            return Ok(());
        }
        let pairs: Vec<String> = just
            .supported_by()
            .iter()
            .map(|s| {
                let fact = self
                    .fact(s.fact)
                    .map(ToString::to_string)
                    .unwrap_or_else(|| s.fact.to_string());
                let rule = self
                    .rule(s.rule)
                    .map(ToString::to_string)
                    .unwrap_or_else(|| s.rule.to_string());
                format!("{fact} + {rule}")
            })
            .collect();
        let asserted = if just.is_asserted() { "asserted; " } else { "" };
        write!(f, "    ; {asserted}supported by {}", pairs.join(" | "))
    }
}
