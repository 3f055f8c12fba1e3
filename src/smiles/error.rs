use std::fmt;

/// Errors produced while tokenizing a SMILES string or building its atom list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    /// A character outside the supported grammar was encountered.
    UnknownCharacter { pos: usize, ch: char },
    /// A bracket atom `[` was opened but never closed with `]`.
    UnclosedBracket { pos: usize },
    /// `%` was not followed by exactly two digits.
    InvalidRingMarker { pos: usize },
    /// One or more ring numbers were still open at the end of input.
    UnclosedRing { rings: Vec<u16> },
    /// A `)` without a matching `(`.
    UnmatchedParen { pos: usize },
    /// A `(` that was never closed.
    UnclosedBranch { pos: usize },
    /// A `(` with no atom to hang from.
    MisplacedBranch { pos: usize },
    /// A branch `()` with no atoms in it.
    EmptyBranch { pos: usize },
    /// A ring marker with no atom to attach to.
    MisplacedRingMarker { pos: usize, ring: u16 },
    /// A bond with no atom on one of its sides.
    DanglingBond { pos: usize },
    /// The `.` separator; disconnected fragments are not modelled.
    Disconnected { pos: usize },
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCharacter { pos, ch } => {
                write!(f, "unknown character '{}' at position {}", ch, pos)
            }
            Self::UnclosedBracket { pos } => {
                write!(f, "unclosed bracket atom starting at position {}", pos)
            }
            Self::InvalidRingMarker { pos } => {
                write!(f, "'%' at position {} must be followed by two digits", pos)
            }
            Self::UnclosedRing { rings } => {
                let list: Vec<String> = rings.iter().map(|r| r.to_string()).collect();
                if rings.len() == 1 {
                    write!(f, "unclosed ring {}", list[0])
                } else {
                    write!(f, "unclosed rings {}", list.join(", "))
                }
            }
            Self::UnmatchedParen { pos } => {
                write!(f, "unmatched ')' at position {}", pos)
            }
            Self::UnclosedBranch { pos } => {
                write!(f, "branch opened at position {} is never closed", pos)
            }
            Self::MisplacedBranch { pos } => {
                write!(f, "branch at position {} has no atom to attach to", pos)
            }
            Self::EmptyBranch { pos } => write!(f, "empty branch at position {}", pos),
            Self::MisplacedRingMarker { pos, ring } => {
                write!(f, "ring marker {} at position {} has no atom", ring, pos)
            }
            Self::DanglingBond { pos } => write!(f, "dangling bond at position {}", pos),
            Self::Disconnected { pos } => write!(
                f,
                "disconnected fragments ('.' at position {}) are not supported",
                pos
            ),
        }
    }
}

impl std::error::Error for SyntaxError {}
