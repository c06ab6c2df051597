//! End-to-end tests for chain-tms.
//!
//! These exercise the full path from the text reader through assertion,
//! chaining, queries and retraction cascades, checking the store's
//! justification invariants after every mutation.

use std::collections::BTreeSet;
use std::io::Write;

use chain_tms::entity::{Entry, Fact, Rule};
use chain_tms::kb::KnowledgeBase;
use chain_tms::reader::{parse_entry, parse_str, read_file};
use chain_tms::term::Statement;
use chain_tms::unify::{instantiate, unify};

const BLOCKS: &str = "\
# blocks world
fact: (isa cube block)
fact: (isa pyramid block)
fact: (isa sphere block)
fact: (size cube big)
fact: (size pyramid small)
fact: (size sphere big)
fact: (on cube table)
fact: (on pyramid cube)

rule: ((isa ?x block) (size ?x big)) -> (heavy ?x)
rule: ((on ?x ?y)) -> (above ?x ?y)
rule: ((on ?x ?y) (above ?y ?z)) -> (above ?x ?z)
rule: ((heavy ?x) (on ?y ?x)) -> (supports ?x ?y)
";

fn entry(text: &str) -> Entry {
    parse_entry(text).unwrap()
}

fn st(pred: &str, terms: &[&str]) -> Statement {
    Statement::parse_terms(pred, terms)
}

fn load(source: &str) -> KnowledgeBase {
    let mut kb = KnowledgeBase::default();
    for e in parse_str(source).unwrap() {
        kb.assert(e);
        kb.validate().unwrap();
    }
    kb
}

fn fact_set(kb: &KnowledgeBase) -> BTreeSet<String> {
    kb.facts().map(|(_, f)| f.statement().to_string()).collect()
}

/// Every single-step consequence of a stored fact and a stored rule is stored.
fn assert_closed(kb: &KnowledgeBase) {
    for (_, rule) in kb.rules() {
        for (_, fact) in kb.facts() {
            let Some(bindings) = unify(fact.statement(), &rule.lhs()[0]) else {
                continue;
            };
            if rule.lhs().len() == 1 {
                let consequent = instantiate(rule.rhs(), &bindings);
                assert!(
                    kb.find_fact(&consequent).is_some(),
                    "{fact} + {rule} should have derived {consequent}"
                );
            } else {
                let derived = Rule::new(
                    rule.lhs()[1..].iter().map(|s| instantiate(s, &bindings)).collect(),
                    instantiate(rule.rhs(), &bindings),
                );
                assert!(
                    kb.find_rule(&derived).is_some(),
                    "{fact} + {rule} should have derived {derived}"
                );
            }
        }
    }
}

#[test]
fn blocks_world_reaches_fixpoint() {
    let kb = load(BLOCKS);

    let facts = fact_set(&kb);
    for expected in [
        "(heavy cube)",
        "(heavy sphere)",
        "(above cube table)",
        "(above pyramid cube)",
        "(above pyramid table)",
        "(supports cube pyramid)",
    ] {
        assert!(facts.contains(expected), "missing {expected}");
    }
    assert!(!facts.contains("(heavy pyramid)"));
    assert_closed(&kb);
}

#[test]
fn assertion_is_idempotent() {
    let mut kb = load(BLOCKS);
    let facts_before = kb.fact_count();
    let rules_before = kb.rule_count();

    kb.assert(entry("fact: (isa cube block)"));
    kb.assert(entry("rule: ((on ?x ?y)) -> (above ?x ?y)"));

    assert_eq!(kb.fact_count(), facts_before);
    assert_eq!(kb.rule_count(), rules_before);
    let cube = kb.find_fact(&st("isa", &["cube", "block"])).unwrap();
    let cube = kb.fact(cube).unwrap();
    assert!(cube.is_asserted());
    assert!(cube.supported_by().is_empty());
    kb.validate().unwrap();
}

#[test]
fn ask_binds_single_matching_fact() {
    let kb = load("fact: (pred 1 2)\nfact: (pred 3 4)\n");

    let answers = kb.ask(entry("fact: (pred ?x 2)"));

    assert_eq!(answers.len(), 1);
    let answer = answers.get(0).unwrap();
    assert_eq!(answer.bindings.to_string(), "?x: 1");
    assert_eq!(answer.facts, vec![st("pred", &["1", "2"])]);
}

#[test]
fn ask_sees_derived_facts() {
    let kb = load(BLOCKS);
    let answers = kb.ask(entry("fact: (above pyramid ?where)"));
    let places: BTreeSet<String> = answers
        .iter()
        .map(|a| a.bindings.to_string())
        .collect();
    assert_eq!(
        places,
        BTreeSet::from(["?where: cube".to_string(), "?where: table".to_string()])
    );
}

#[test]
fn ask_rejects_rules() {
    let kb = load(BLOCKS);
    assert!(kb.ask(entry("rule: ((on ?x ?y)) -> (above ?x ?y)")).is_empty());
}

#[test]
fn retraction_cascades_to_derived_fact() {
    let mut kb = load("fact: (f a)\nrule: ((f ?x)) -> (g ?x)\n");
    assert!(kb.find_fact(&st("g", &["a"])).is_some());

    let result = kb.retract(entry("fact: (f a)"));

    assert_eq!(result.retracted_facts.len(), 2);
    assert!(kb.find_fact(&st("f", &["a"])).is_none());
    assert!(kb.find_fact(&st("g", &["a"])).is_none());
    kb.validate().unwrap();
}

#[test]
fn multiply_supported_fact_survives() {
    let mut kb = load(
        "fact: (f1 a)\nfact: (f2 a)\nrule: ((f1 ?x)) -> (g ?x)\nrule: ((f2 ?x)) -> (g ?x)\n",
    );

    kb.retract(entry("fact: (f1 a)"));

    let g = kb.find_fact(&st("g", &["a"])).unwrap();
    assert_eq!(kb.fact(g).unwrap().supported_by().len(), 1);
    kb.validate().unwrap();

    kb.retract(entry("fact: (f2 a)"));
    assert!(kb.find_fact(&st("g", &["a"])).is_none());
    kb.validate().unwrap();
}

#[test]
fn multi_antecedent_chaining_is_order_independent() {
    let rule = "rule: ((p ?x) (q ?x)) -> (r ?x)\n";
    let forward = load(&format!("{rule}fact: (p 1)\nfact: (q 1)\n"));
    let backward = load(&format!("{rule}fact: (q 1)\nfact: (p 1)\n"));
    let facts_first = load(&format!("fact: (q 1)\nfact: (p 1)\n{rule}"));

    let expected = BTreeSet::from([
        "(p 1)".to_string(),
        "(q 1)".to_string(),
        "(r 1)".to_string(),
    ]);
    assert_eq!(fact_set(&forward), expected);
    assert_eq!(fact_set(&backward), expected);
    assert_eq!(fact_set(&facts_first), expected);

    let partial = Rule::new(vec![st("q", &["1"])], st("r", &["1"]));
    for kb in [&forward, &backward, &facts_first] {
        let id = kb.find_rule(&partial).unwrap();
        assert!(!kb.rule(id).unwrap().is_asserted());
    }
}

#[test]
fn retracting_one_antecedent_fact_removes_conclusion() {
    let mut kb = load(BLOCKS);
    assert!(kb.find_fact(&st("supports", &["cube", "pyramid"])).is_some());

    kb.retract(entry("fact: (size cube big)"));

    assert!(kb.find_fact(&st("heavy", &["cube"])).is_none());
    assert!(kb.find_fact(&st("supports", &["cube", "pyramid"])).is_none());
    assert!(kb.find_fact(&st("heavy", &["sphere"])).is_some());
    assert!(kb.find_fact(&st("above", &["pyramid", "table"])).is_some());
    kb.validate().unwrap();
    assert_closed(&kb);
}

#[test]
fn retracting_then_reasserting_restores_closure() {
    let mut kb = load(BLOCKS);
    let before = fact_set(&kb);

    kb.retract(entry("fact: (on cube table)"));
    assert!(kb.find_fact(&st("above", &["pyramid", "table"])).is_none());
    kb.validate().unwrap();

    kb.assert(entry("fact: (on cube table)"));
    kb.validate().unwrap();
    assert_eq!(fact_set(&kb), before);
    assert_closed(&kb);
}

#[test]
fn retracting_rule_removes_its_consequences_only() {
    let mut kb = load(BLOCKS);

    let result = kb.retract(entry("rule: ((isa ?x block) (size ?x big)) -> (heavy ?x)"));

    assert!(!result.is_noop());
    assert!(kb.find_fact(&st("heavy", &["cube"])).is_none());
    assert!(kb.find_fact(&st("supports", &["cube", "pyramid"])).is_none());
    assert!(kb.find_fact(&st("above", &["pyramid", "table"])).is_some());
    kb.validate().unwrap();
}

#[test]
fn supported_entry_is_not_retracted() {
    let mut kb = load(BLOCKS);
    let facts_before = kb.fact_count();

    let result = kb.retract(entry("fact: (heavy cube)"));

    assert!(result.still_supported);
    assert_eq!(kb.fact_count(), facts_before);
    kb.validate().unwrap();
}

#[test]
fn unknown_retraction_is_silent() {
    let mut kb = load(BLOCKS);
    let facts_before = kb.fact_count();
    let result = kb.retract(Fact::new(st("isa", &["moon", "block"])));
    assert!(result.is_noop());
    assert_eq!(kb.fact_count(), facts_before);
}

#[test]
fn reads_statement_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(BLOCKS.as_bytes()).unwrap();

    let entries = read_file(file.path()).unwrap();
    assert_eq!(entries.len(), 12);

    let mut kb = KnowledgeBase::default();
    for e in entries {
        kb.assert(e);
    }
    assert!(kb.find_fact(&st("heavy", &["sphere"])).is_some());

    let dump = kb.to_string();
    assert!(dump.starts_with("Knowledge Base:\n(isa cube block)\n"));
}

#[test]
fn export_round_trips_through_json() {
    let kb = load(BLOCKS);
    let json = kb.export_json().unwrap();
    let parsed: chain_tms::export::KnowledgeBaseExport = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.facts.len(), kb.fact_count());
    assert_eq!(parsed.rules.len(), kb.rule_count());
}
