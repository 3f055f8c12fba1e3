//! Checks that generated SMILES describe a well-formed molecular graph.
//!
//! [`GraphValidator`] works in-process on the parse graph.
//! [`CommandValidator`] hands the string to an external checker named by
//! the `FRAGCRAB_VALIDATOR` environment variable.

use std::collections::BTreeSet;
use std::io::Write;
use std::process::{Command, Stdio};

use log::debug;
use petgraph::algo::connected_components;
use petgraph::visit::EdgeRef;

use crate::graph::to_graph;
use crate::smiles::parse_atoms;

pub const VALIDATOR_ENV: &str = "FRAGCRAB_VALIDATOR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid(String),
    Skipped(String),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }

    /// True unless the validator ran and rejected the input.
    pub fn passes(&self) -> bool {
        !matches!(self, Verdict::Invalid(_))
    }
}

pub trait SmilesValidator {
    fn check(&self, smiles: &str) -> Verdict;
}

/// Parses the input and requires a single connected component with no
/// atom pair bonded twice.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphValidator;

impl SmilesValidator for GraphValidator {
    fn check(&self, smiles: &str) -> Verdict {
        let list = match parse_atoms(smiles) {
            Ok(list) => list,
            Err(e) => return Verdict::Invalid(e.to_string()),
        };
        let graph = to_graph(&list);

        let mut seen = BTreeSet::new();
        for edge in graph.edge_references() {
            let (a, b) = (edge.source().index(), edge.target().index());
            if a == b {
                return Verdict::Invalid(format!("atom {} is bonded to itself", a));
            }
            if !seen.insert((a.min(b), a.max(b))) {
                return Verdict::Invalid(format!("atoms {} and {} are bonded twice", a, b));
            }
        }

        let components = connected_components(&graph);
        if components > 1 {
            return Verdict::Invalid(format!("{} disconnected components", components));
        }
        Verdict::Valid
    }
}

/// Runs an external program with the SMILES on stdin; exit status zero
/// means valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandValidator {
    program: String,
    args: Vec<String>,
}

impl CommandValidator {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Reads the command line from `FRAGCRAB_VALIDATOR`, split on
    /// whitespace.
    pub fn from_env() -> Option<Self> {
        let line = std::env::var(VALIDATOR_ENV).ok()?;
        let mut words = line.split_whitespace();
        let program = words.next()?;
        let args: Vec<&str> = words.collect();
        Some(Self::new(program, &args))
    }

    fn run(&self, smiles: &str) -> std::io::Result<std::process::Output> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(smiles.as_bytes())?;
            stdin.write_all(b"\n")?;
        }
        child.wait_with_output()
    }
}

impl SmilesValidator for CommandValidator {
    fn check(&self, smiles: &str) -> Verdict {
        match self.run(smiles) {
            Ok(output) if output.status.success() => Verdict::Valid,
            Ok(output) => Verdict::Invalid(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ),
            Err(e) => {
                debug!("validator {} did not run: {}", self.program, e);
                Verdict::Skipped(format!("failed to run {}: {}", self.program, e))
            }
        }
    }
}

/// Checks with the external validator when one is configured.
pub fn check_with_env(smiles: &str) -> Verdict {
    match CommandValidator::from_env() {
        Some(validator) => validator.check(smiles),
        None => Verdict::Skipped(format!("{} is not set", VALIDATOR_ENV)),
    }
}
