//! Unification and substitution over [`Statement`]s.
//!
//! [`unify`] computes the bindings that make two statements identical,
//! [`instantiate`] applies bindings to a template. [`Answers`] is the
//! result shape of a knowledge-base query: one [`Answer`] per successful
//! unification, each carrying its bindings and the facts that produced it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::term::{Statement, Term};

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// A single `?variable -> term` substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub variable: String,
    pub value: Term,
}

/// An ordered substitution. Order is the order in which variables were
/// first bound during unification, which keeps printing deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bindings {
    bindings: Vec<Binding>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// The term bound to `variable`, if any.
    pub fn bound_to(&self, variable: &str) -> Option<&Term> {
        self.bindings
            .iter()
            .find(|b| b.variable == variable)
            .map(|b| &b.value)
    }

    /// Bind `variable` to `value` if unbound; otherwise check that the
    /// existing binding agrees. Returns `false` on conflict.
    pub fn test_and_bind(&mut self, variable: &str, value: &Term) -> bool {
        match self.bound_to(variable) {
            Some(existing) => existing == value,
            None => {
                self.bindings.push(Binding {
                    variable: variable.to_string(),
                    value: value.clone(),
                });
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }
}

impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bindings.is_empty() {
            return write!(f, "{{}}");
        }
        for (i, b) in self.bindings.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "?{}: {}", b.variable, b.value)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Unification
// ---------------------------------------------------------------------------

/// Unify two statements position by position.
///
/// Variables may occur on either side; a variable on the left is bound
/// first. A variable that is already bound must meet the same term again.
/// Returns `None` when predicates, arities or any position disagree. Two
/// identical ground statements unify with empty bindings.
///
/// ```
/// use chain_tms::term::Statement;
/// use chain_tms::unify::unify;
///
/// let query = Statement::parse_terms("pred", &["?x", "2"]);
/// let fact = Statement::parse_terms("pred", &["1", "2"]);
/// let b = unify(&query, &fact).unwrap();
/// assert_eq!(b.to_string(), "?x: 1");
/// ```
pub fn unify(a: &Statement, b: &Statement) -> Option<Bindings> {
    if a.predicate() != b.predicate() || a.arity() != b.arity() {
        return None;
    }

    let mut bindings = Bindings::new();
    for (left, right) in a.terms().iter().zip(b.terms()) {
        let agreed = match (left, right) {
            (Term::Variable(var), value) => bindings.test_and_bind(var, value),
            (value, Term::Variable(var)) => bindings.test_and_bind(var, value),
            (left, right) => left == right,
        };
        if !agreed {
            return None;
        }
    }
    Some(bindings)
}

/// Apply `bindings` to every variable of `template`. Unbound variables are
/// left in place; the template itself is never modified.
pub fn instantiate(template: &Statement, bindings: &Bindings) -> Statement {
    let terms = template
        .terms()
        .iter()
        .map(|term| match term {
            Term::Variable(var) => bindings.bound_to(var).cloned().unwrap_or_else(|| term.clone()),
            Term::Constant(_) => term.clone(),
        })
        .collect();
    Statement::new(template.predicate(), terms)
}

// ---------------------------------------------------------------------------
// Query answers
// ---------------------------------------------------------------------------

/// One successful unification of a query: the bindings plus the facts
/// that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub bindings: Bindings,
    pub facts: Vec<Statement>,
}

/// All answers to a query, in store order. Empty means "no match", which
/// is an ordinary outcome rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answers {
    answers: Vec<Answer>,
}

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, bindings: Bindings, facts: Vec<Statement>) {
        self.answers.push(Answer { bindings, facts });
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Answer> {
        self.answers.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Answer> {
        self.answers.get(index)
    }
}

impl IntoIterator for Answers {
    type Item = Answer;
    type IntoIter = std::vec::IntoIter<Answer>;

    fn into_iter(self) -> Self::IntoIter {
        self.answers.into_iter()
    }
}

impl fmt::Display for Answers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for answer in &self.answers {
            writeln!(f, "Bindings: {}", answer.bindings)?;
            let facts: Vec<String> = answer.facts.iter().map(ToString::to_string).collect();
            writeln!(f, "Supported by: [{}]", facts.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn st(pred: &str, terms: &[&str]) -> Statement {
        Statement::parse_terms(pred, terms)
    }

    #[test]
    fn unify_binds_query_variables() {
        let b = unify(&st("isa", &["?x", "block"]), &st("isa", &["cube", "block"])).unwrap();
        assert_eq!(b.bound_to("x"), Some(&Term::constant("cube")));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn unify_accepts_variables_on_right() {
        let b = unify(&st("isa", &["cube", "block"]), &st("isa", &["?y", "block"])).unwrap();
        assert_eq!(b.bound_to("y"), Some(&Term::constant("cube")));
    }

    #[test]
    fn unify_rejects_mismatches() {
        assert!(unify(&st("isa", &["cube"]), &st("size", &["cube"])).is_none());
        assert!(unify(&st("isa", &["cube"]), &st("isa", &["cube", "x"])).is_none());
        assert!(unify(&st("isa", &["cube", "block"]), &st("isa", &["cube", "box"])).is_none());
    }

    #[test]
    fn repeated_variable_must_agree() {
        let pattern = st("same", &["?x", "?x"]);
        assert!(unify(&pattern, &st("same", &["a", "a"])).is_some());
        assert!(unify(&pattern, &st("same", &["a", "b"])).is_none());
    }

    #[test]
    fn ground_statements_unify_with_empty_bindings() {
        let b = unify(&st("p", &["1"]), &st("p", &["1"])).unwrap();
        assert!(b.is_empty());
        assert_eq!(b.to_string(), "{}");
    }

    #[test]
    fn instantiate_replaces_bound_only() {
        let mut b = Bindings::new();
        assert!(b.test_and_bind("x", &Term::constant("cube")));
        let out = instantiate(&st("on", &["?x", "?y"]), &b);
        assert_eq!(out, st("on", &["cube", "?y"]));
        assert!(!out.is_ground());
    }

    #[test]
    fn test_and_bind_conflict() {
        let mut b = Bindings::new();
        assert!(b.test_and_bind("x", &Term::constant("1")));
        assert!(b.test_and_bind("x", &Term::constant("1")));
        assert!(!b.test_and_bind("x", &Term::constant("2")));
    }

    #[test]
    fn answers_display() {
        let mut answers = Answers::new();
        let b = unify(&st("p", &["?x", "2"]), &st("p", &["1", "2"])).unwrap();
        answers.add(b, vec![st("p", &["1", "2"])]);
        let text = answers.to_string();
        assert!(text.contains("Bindings: ?x: 1"));
        assert!(text.contains("Supported by: [(p 1 2)]"));
    }
}
