//! chain-tms CLI: load a statement file, then dump, query or retract.

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use miette::Result;

use chain_tms::kb::{KnowledgeBase, KnowledgeBaseConfig, Verbosity};
use chain_tms::reader::{parse_entry, read_file};

#[derive(Parser)]
#[command(
    name = "chain-tms",
    version,
    about = "Forward-chaining rule engine with truth maintenance"
)]
struct Cli {
    /// Narrate knowledge-base operations (-v: assert/ask/retract, -vv: every inference step).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a statement file and print the resulting knowledge base.
    Dump {
        /// File of `fact:` / `rule:` lines.
        file: PathBuf,
    },

    /// Load a statement file and ask a query.
    Ask {
        /// File of `fact:` / `rule:` lines.
        file: PathBuf,
        /// Query in fact syntax, e.g. "fact: (isa ?x block)".
        query: String,
    },

    /// Load a statement file, retract one entry, and report the cascade.
    Retract {
        /// File of `fact:` / `rule:` lines.
        file: PathBuf,
        /// Entry to retract, e.g. "fact: (isa cube block)".
        target: String,
    },

    /// Load a statement file and print the knowledge base as JSON.
    Export {
        /// File of `fact:` / `rule:` lines.
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    let cli = Cli::parse();
    let verbosity = Verbosity::from_count(cli.verbose);

    let default_filter = if verbosity.shows_inference() { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Dump { file } => {
            let kb = load(&file, verbosity)?;
            print!("{kb}");
        }

        Commands::Ask { file, query } => {
            let kb = load(&file, verbosity)?;
            let query = parse_entry(&query)?;
            let answers = kb.ask(query);
            if answers.is_empty() {
                println!("No answers.");
            } else {
                print!("{answers}");
            }
        }

        Commands::Retract { file, target } => {
            let mut kb = load(&file, verbosity)?;
            let target = parse_entry(&target)?;
            let result = kb.retract(target);

            if result.still_supported {
                println!("Entry is still supported by a derivation; nothing retracted.");
            } else if result.is_noop() {
                println!("Entry not found; nothing retracted.");
            } else {
                println!(
                    "Retracted {} fact(s) and {} rule(s) (cascade depth {}):",
                    result.retracted_facts.len(),
                    result.retracted_rules.len(),
                    result.cascade_depth
                );
                for fact in &result.retracted_facts {
                    println!("  fact: {fact}");
                }
                for rule in &result.retracted_rules {
                    println!("  rule: {rule}");
                }
            }
            println!();
            print!("{kb}");
        }

        Commands::Export { file } => {
            let kb = load(&file, verbosity)?;
            println!("{}", kb.export_json()?);
        }
    }

    Ok(())
}

/// Assert every entry of `file`, in file order.
fn load(file: &Path, verbosity: Verbosity) -> Result<KnowledgeBase> {
    let entries = read_file(file)?;
    let mut kb = KnowledgeBase::new(KnowledgeBaseConfig { verbosity });
    for entry in entries {
        kb.assert(entry);
    }
    if verbosity.shows_actions() {
        tracing::info!(
            file = %file.display(),
            facts = kb.fact_count(),
            rules = kb.rule_count(),
            "knowledge base loaded"
        );
    }
    Ok(kb)
}
