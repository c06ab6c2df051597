// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # chain-tms
//!
//! A forward-chaining rule engine with justification-based truth
//! maintenance.
//!
//! ## Architecture
//!
//! - **Statements** (`term`, `unify`): flat predicate statements, unification
//!   and instantiation
//! - **Entities** (`entity`): facts and rules with their justification records
//! - **Knowledge base** (`kb`): arena store, dedupe, eager chaining, queries
//! - **Inference** (`infer`): one fact against the first antecedent of one rule
//! - **Truth maintenance** (`tms`): retraction cascades over the support graph
//! - **Reader** (`reader`): the `fact:` / `rule:` text format
//!
//! ## Library usage
//!
//! ```
//! use chain_tms::kb::KnowledgeBase;
//! use chain_tms::reader::parse_entry;
//!
//! let mut kb = KnowledgeBase::default();
//! kb.assert(parse_entry("fact: (isa cube block)").unwrap());
//! kb.assert(parse_entry("rule: ((isa ?x block)) -> (solid ?x)").unwrap());
//!
//! let answers = kb.ask(parse_entry("fact: (solid ?y)").unwrap());
//! assert_eq!(answers.len(), 1);
//!
//! kb.retract(parse_entry("fact: (isa cube block)").unwrap());
//! assert!(kb.ask(parse_entry("fact: (solid ?y)").unwrap()).is_empty());
//! ```

pub mod entity;
pub mod error;
pub mod export;
pub mod infer;
pub mod kb;
pub mod reader;
pub mod term;
pub mod tms;
pub mod unify;
