//! Symbolic terms and statements.
//!
//! A [`Statement`] is a predicate applied to an ordered list of [`Term`]s.
//! Terms are either constants or variables; the textual form of a variable
//! is `?name`, but the stored name omits the `?`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single argument of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    /// A constant symbol, e.g. `cube`.
    Constant(String),
    /// A variable, e.g. `?x` (stored as `x`).
    Variable(String),
}

impl Term {
    /// Create a constant term.
    pub fn constant(name: impl Into<String>) -> Self {
        Self::Constant(name.into())
    }

    /// Create a variable term. A leading `?` is stripped.
    pub fn variable(name: impl Into<String>) -> Self {
        let name = name.into();
        match name.strip_prefix('?') {
            Some(bare) => Self::Variable(bare.to_string()),
            None => Self::Variable(name),
        }
    }

    /// Parse a token: `?x` becomes a variable, anything else a constant.
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        match token.strip_prefix('?') {
            Some(var) => Self::Variable(var.to_string()),
            None => Self::Constant(token.to_string()),
        }
    }

    /// Returns `true` if this term is a variable.
    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Constant(c) => write!(f, "{c}"),
            Term::Variable(v) => write!(f, "?{v}"),
        }
    }
}

/// A predicate with its ordered arguments. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Statement {
    predicate: String,
    terms: Vec<Term>,
}

impl Statement {
    pub fn new(predicate: impl Into<String>, terms: Vec<Term>) -> Self {
        Self {
            predicate: predicate.into(),
            terms,
        }
    }

    /// Build a statement from string tokens, using [`Term::parse`] for each.
    ///
    /// ```
    /// use chain_tms::term::{Statement, Term};
    ///
    /// let s = Statement::parse_terms("isa", &["?x", "block"]);
    /// assert_eq!(s.terms()[0], Term::variable("x"));
    /// assert_eq!(s.to_string(), "(isa ?x block)");
    /// ```
    pub fn parse_terms(predicate: impl Into<String>, tokens: &[&str]) -> Self {
        Self::new(predicate, tokens.iter().map(|t| Term::parse(t)).collect())
    }

    pub fn predicate(&self) -> &str {
        &self.predicate
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn arity(&self) -> usize {
        self.terms.len()
    }

    /// True when no argument is a variable.
    pub fn is_ground(&self) -> bool {
        !self.terms.iter().any(Term::is_variable)
    }

    /// Iterate over the variables of this statement in argument order
    /// (duplicates included).
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().filter_map(|t| match t {
            Term::Variable(v) => Some(v.as_str()),
            Term::Constant(_) => None,
        })
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.predicate)?;
        for term in &self.terms {
            write!(f, " {term}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_distinguishes_variables() {
        assert_eq!(Term::parse("?x"), Term::Variable("x".into()));
        assert_eq!(Term::parse("cube"), Term::Constant("cube".into()));
        assert_eq!(Term::variable("?y"), Term::variable("y"));
    }

    #[test]
    fn ground_check() {
        let ground = Statement::parse_terms("isa", &["cube", "block"]);
        let open = Statement::parse_terms("isa", &["?x", "block"]);
        assert!(ground.is_ground());
        assert!(!open.is_ground());
        assert_eq!(open.variables().collect::<Vec<_>>(), vec!["x"]);
    }

    #[test]
    fn display_matches_reader_syntax() {
        let s = Statement::parse_terms("size", &["?x", "big"]);
        assert_eq!(s.to_string(), "(size ?x big)");
        let nullary = Statement::new("raining", Vec::new());
        assert_eq!(nullary.to_string(), "(raining)");
    }

    #[test]
    fn equality_is_structural() {
        let a = Statement::parse_terms("p", &["1", "2"]);
        let b = Statement::parse_terms("p", &["1", "2"]);
        let c = Statement::parse_terms("p", &["2", "1"]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.arity(), 2);
    }
}
