//! Statement reader for the textual fact/rule language.
//!
//! One entry per line:
//!
//! ```text
//! # comments start with '#' or ';'
//! fact: (isa cube block)
//! rule: ((isa ?x block) (size ?x big)) -> (heavy ?x)
//! ```
//!
//! Tokens starting with `?` are variables. Statements are flat: a
//! predicate followed by constants and variables, no nesting.

use std::path::Path;

use crate::entity::{Entry, Fact, Rule};
use crate::error::{TmsError, TmsResult};
use crate::term::{Statement, Term};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Arrow,
    Symbol(String),
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();

    let flush = |word: &mut String, tokens: &mut Vec<Token>| {
        if word.is_empty() {
            return;
        }
        let token = if word == "->" {
            Token::Arrow
        } else {
            Token::Symbol(word.clone())
        };
        tokens.push(token);
        word.clear();
    };

    for ch in text.chars() {
        match ch {
            '(' | ')' => {
                flush(&mut word, &mut tokens);
                tokens.push(if ch == '(' { Token::Open } else { Token::Close });
            }
            c if c.is_whitespace() => flush(&mut word, &mut tokens),
            c => word.push(c),
        }
    }
    flush(&mut word, &mut tokens);
    tokens
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    line: usize,
}

impl Parser {
    fn new(text: &str, line: usize) -> Self {
        Self {
            tokens: tokenize(text),
            pos: 0,
            line,
        }
    }

    fn error(&self, message: impl Into<String>) -> TmsError {
        TmsError::Parse {
            line: self.line,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token, what: &str) -> TmsResult<()> {
        match self.advance() {
            Some(token) if token == expected => Ok(()),
            Some(other) => Err(self.error(format!("expected {what}, found {}", describe(&other)))),
            None => Err(self.error(format!("expected {what}, found end of line"))),
        }
    }

    /// `( predicate term* )`
    fn statement(&mut self) -> TmsResult<Statement> {
        self.expect(Token::Open, "'(' to open a statement")?;
        let predicate = match self.advance() {
            Some(Token::Symbol(p)) if !p.starts_with('?') => p,
            Some(Token::Symbol(p)) => {
                return Err(self.error(format!("predicate cannot be a variable: '{p}'")));
            }
            Some(other) => {
                return Err(self.error(format!("expected a predicate, found {}", describe(&other))));
            }
            None => return Err(self.error("expected a predicate, found end of line")),
        };

        let mut terms = Vec::new();
        loop {
            match self.advance() {
                Some(Token::Close) => break,
                Some(Token::Symbol(s)) => {
                    if s == "?" {
                        return Err(self.error("variable is missing a name after '?'"));
                    }
                    terms.push(Term::parse(&s));
                }
                Some(other) => {
                    return Err(self.error(format!(
                        "unexpected {} inside statement '{predicate}'",
                        describe(&other)
                    )));
                }
                None => return Err(self.error(format!("unclosed statement '{predicate}'"))),
            }
        }
        Ok(Statement::new(predicate, terms))
    }

    /// `( statement+ ) -> statement`
    fn rule(&mut self) -> TmsResult<Rule> {
        self.expect(Token::Open, "'(' to open the antecedent list")?;
        let mut lhs = Vec::new();
        while self.peek() == Some(&Token::Open) {
            lhs.push(self.statement()?);
        }
        self.expect(Token::Close, "')' to close the antecedent list")?;
        if lhs.is_empty() {
            return Err(self.error("a rule needs at least one antecedent"));
        }
        self.expect(Token::Arrow, "'->'")?;
        let rhs = self.statement()?;
        Ok(Rule::new(lhs, rhs))
    }

    fn finish(&self) -> TmsResult<()> {
        match self.peek() {
            None => Ok(()),
            Some(extra) => Err(self.error(format!("trailing {}", describe(extra)))),
        }
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Open => "'('".into(),
        Token::Close => "')'".into(),
        Token::Arrow => "'->'".into(),
        Token::Symbol(s) => format!("'{s}'"),
    }
}

fn is_blank_or_comment(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#') || line.starts_with(';')
}

fn parse_line(text: &str, line: usize) -> TmsResult<Entry> {
    let text = text.trim();
    let (kind, body) = text.split_once(':').ok_or_else(|| TmsError::Parse {
        line,
        message: "expected 'fact:' or 'rule:' prefix".into(),
    })?;

    let mut parser = Parser::new(body, line);
    let entry = match kind.trim().to_lowercase().as_str() {
        "fact" => Entry::Fact(Fact::new(parser.statement()?)),
        "rule" => Entry::Rule(parser.rule()?),
        other => return Err(parser.error(format!("unknown entry kind '{other}'"))),
    };
    parser.finish()?;
    Ok(entry)
}

/// Parse a single entry such as `fact: (isa cube block)`.
pub fn parse_entry(text: &str) -> TmsResult<Entry> {
    parse_line(text, 1)
}

/// Parse every entry of a multi-line source, skipping blank and comment
/// lines. Line numbers in errors are 1-based.
pub fn parse_str(source: &str) -> TmsResult<Vec<Entry>> {
    source
        .lines()
        .enumerate()
        .filter(|(_, line)| !is_blank_or_comment(line))
        .map(|(i, line)| parse_line(line, i + 1))
        .collect()
}

/// Read and parse a statement file.
pub fn read_file(path: &Path) -> TmsResult<Vec<Entry>> {
    let source = std::fs::read_to_string(path).map_err(|source| TmsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_str(&source)
}
