//! Truth maintenance: dependency-directed retraction.
//!
//! Every derived fact or rule records the `(fact, rule)` pairs that justify
//! it, and every entity records what it helped derive. Retracting an
//! unsupported entity removes it and walks its dependents:
//!
//! 1. Pairs naming the removed entity are dropped from each dependent.
//! 2. A dependent left with no pairs and no assertion is removed too, and
//!    the walk continues from it.
//! 3. A dependent that is still justified, or was asserted by a caller,
//!    survives with its remaining support.
//!
//! An entity that is still supported when retracted directly is left in
//! place untouched, asserted flag included.

use std::collections::{HashSet, VecDeque};

use crate::entity::{Entry, EntryId, Fact, Rule};
use crate::kb::KnowledgeBase;

/// Result of a retraction cascade.
#[derive(Debug, Clone, Default)]
pub struct RetractionResult {
    /// Facts removed from the store, in removal order.
    pub retracted_facts: Vec<Fact>,
    /// Rules removed from the store, in removal order.
    pub retracted_rules: Vec<Rule>,
    /// Dependents that lost a support but stayed, being still justified
    /// or asserted. Handles remain valid.
    pub re_evaluated: Vec<EntryId>,
    /// The target exists but is still supported, so nothing was removed.
    pub still_supported: bool,
    /// Largest BFS level at which an entity was removed; the target is
    /// level 0 and each dependent is one level below the entity that
    /// queued it.
    pub cascade_depth: usize,
}

impl RetractionResult {
    /// Total number of removed entities.
    pub fn retracted_count(&self) -> usize {
        self.retracted_facts.len() + self.retracted_rules.len()
    }

    /// True when the store was not changed.
    pub fn is_noop(&self) -> bool {
        self.retracted_count() == 0
    }
}

impl KnowledgeBase {
    /// Retract a fact or rule and cascade through everything that loses its
    /// last justification as a result.
    ///
    /// Retracting an entry that is not stored is a silent no-op, and an
    /// entry that is still supported by a derivation stays where it is
    /// (see [`RetractionResult::still_supported`]).
    pub fn retract(&mut self, entry: impl Into<Entry>) -> RetractionResult {
        let entry = entry.into();
        let verbosity = self.config().verbosity;
        if verbosity.shows_actions() {
            tracing::info!(%entry, "retracting");
        }

        let mut result = RetractionResult::default();
        let Some(target) = self.lookup(&entry) else {
            if verbosity.shows_inference() {
                tracing::debug!(%entry, "not in the knowledge base; nothing to retract");
            }
            return result;
        };

        if self.justification(target).is_some_and(|j| j.is_supported()) {
            if verbosity.shows_actions() {
                tracing::info!(%entry, "still supported by a derivation; left in place");
            }
            result.still_supported = true;
            return result;
        }

        self.cascade(target, &mut result);

        if verbosity.shows_actions() {
            tracing::info!(
                facts = result.retracted_facts.len(),
                rules = result.retracted_rules.len(),
                survivors = result.re_evaluated.len(),
                depth = result.cascade_depth,
                "retraction complete"
            );
        }
        result
    }

    /// Remove `target` and every dependent that becomes unfounded.
    fn cascade(&mut self, target: EntryId, result: &mut RetractionResult) {
        let verbose = self.config().verbosity.shows_inference();
        let mut queue: VecDeque<(EntryId, usize)> = VecDeque::new();
        let mut visited = HashSet::new();
        queue.push_back((target, 0));
        visited.insert(target);

        while let Some((current, depth)) = queue.pop_front() {
            let (dep_facts, dep_rules) = match current {
                EntryId::Fact(id) => {
                    let Some(mut fact) = self.remove_fact(id) else {
                        continue;
                    };
                    let deps = fact.justification_mut().take_dependents();
                    if verbose {
                        tracing::debug!(fact = %fact, depth, "removed");
                    }
                    result.retracted_facts.push(fact);
                    deps
                }
                EntryId::Rule(id) => {
                    let Some(mut rule) = self.remove_rule(id) else {
                        continue;
                    };
                    let deps = rule.justification_mut().take_dependents();
                    if verbose {
                        tracing::debug!(rule = %rule, depth, "removed");
                    }
                    result.retracted_rules.push(rule);
                    deps
                }
            };
            result.cascade_depth = result.cascade_depth.max(depth);

            let dependents = dep_facts
                .into_iter()
                .map(EntryId::Fact)
                .chain(dep_rules.into_iter().map(EntryId::Rule));
            for dependent in dependents {
                let Some(unfounded) = self.withdraw_support(dependent, current) else {
                    continue;
                };
                if unfounded {
                    if visited.insert(dependent) {
                        queue.push_back((dependent, depth + 1));
                    }
                } else if !result.re_evaluated.contains(&dependent) {
                    if verbose {
                        tracing::debug!(entity = %dependent, "still justified; kept");
                    }
                    result.re_evaluated.push(dependent);
                }
            }
        }

        result.re_evaluated.retain(|id| !visited.contains(id));
    }

    /// Drop every pair of `dependent` that names `removed`, and detach
    /// `dependent` from the other member of each dropped pair unless another
    /// pair still links the two.
    ///
    /// Returns whether `dependent` is now unfounded, or `None` if it is no
    /// longer stored.
    fn withdraw_support(&mut self, dependent: EntryId, removed: EntryId) -> Option<bool> {
        let just = self.justification_mut(dependent)?;
        let dropped = just.remove_supports_naming(removed);
        let unfounded = just.is_unfounded();

        for pair in dropped {
            let partner = match removed {
                EntryId::Fact(_) => EntryId::Rule(pair.rule),
                EntryId::Rule(_) => EntryId::Fact(pair.fact),
            };
            let still_linked = self
                .justification(dependent)
                .is_some_and(|j| j.is_supported_through(partner));
            if !still_linked {
                if let Some(partner_just) = self.justification_mut(partner) {
                    partner_just.unlink(dependent);
                }
            }
        }
        Some(unfounded)
    }
}
