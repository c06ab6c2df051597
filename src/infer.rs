//! One forward-chaining step.
//!
//! [`InferenceEngine::infer`] tries a single fact against the first
//! antecedent of a single rule. On success it produces exactly one new
//! entity (a fact when the rule had one antecedent, otherwise a rule with
//! the remaining antecedents), records the `(fact, rule)` justification on
//! both sides, and hands the result to the knowledge base, which queues
//! any further chaining on its agenda.

use crate::entity::{EntryId, Fact, FactId, Justification, Rule, RuleId, Support};
use crate::kb::KnowledgeBase;
use crate::term::Statement;
use crate::unify::{instantiate, unify};

/// What a successful unification produces.
enum Derivation {
    Fact(Statement),
    Rule(Vec<Statement>, Statement),
}

/// Stateless forward chainer.
#[derive(Debug, Clone, Copy, Default)]
pub struct InferenceEngine;

impl InferenceEngine {
    pub fn new() -> Self {
        Self
    }

    /// Unify `fact` with the leftmost antecedent of `rule` and, on success,
    /// add the derived entity to `kb` and chain from it to a fixpoint.
    ///
    /// Returns the handle of the canonical derived entity (which may be a
    /// pre-existing equal entity that gained a support), or `None` when
    /// nothing was derived.
    pub fn infer(&self, kb: &mut KnowledgeBase, fact_id: FactId, rule_id: RuleId) -> Option<EntryId> {
        let derived = self.step(kb, fact_id, rule_id);
        kb.saturate();
        derived
    }

    /// The single step of [`Self::infer`] without draining the agenda.
    pub(crate) fn step(&self, kb: &mut KnowledgeBase, fact_id: FactId, rule_id: RuleId) -> Option<EntryId> {
        let derivation = {
            let fact = kb.fact(fact_id)?;
            let rule = kb.rule(rule_id)?;
            if kb.config().verbosity.shows_inference() {
                tracing::debug!(fact = %fact, rule = %rule, "attempting inference");
            }

            let (first, rest) = rule.lhs().split_first()?;
            let bindings = unify(fact.statement(), first)?;
            let rhs = instantiate(rule.rhs(), &bindings);
            if rest.is_empty() {
                if !rhs.is_ground() {
                    tracing::warn!(
                        rule = %rule,
                        consequent = %rhs,
                        "consequent has variables not bound by the antecedents; dropped"
                    );
                    return None;
                }
                Derivation::Fact(rhs)
            } else {
                let lhs = rest.iter().map(|s| instantiate(s, &bindings)).collect();
                Derivation::Rule(lhs, rhs)
            }
        };

        let support = Support::new(fact_id, rule_id);
        let derived = match derivation {
            Derivation::Fact(statement) => {
                let id = kb.add_fact(Fact::derived(statement, support));
                EntryId::Fact(id)
            }
            Derivation::Rule(lhs, rhs) => {
                let id = kb.add_rule(Rule::derived(lhs, rhs, support));
                EntryId::Rule(id)
            }
        };

        if let Some(fact) = kb.fact_mut(fact_id) {
            link(fact.justification_mut(), derived);
        }
        if let Some(rule) = kb.rule_mut(rule_id) {
            link(rule.justification_mut(), derived);
        }
        Some(derived)
    }
}

fn link(just: &mut Justification, derived: EntryId) {
    match derived {
        EntryId::Fact(id) => just.link_fact(id),
        EntryId::Rule(id) => just.link_rule(id),
    }
}
