use std::fmt;

use crate::smiles::SyntaxError;

/// Argument and position validation failures of the builder combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// A 1-based position outside `1..=max`.
    InvalidPosition { max: usize, got: usize },
    /// A ring smaller than three atoms.
    InvalidSize { got: usize },
    /// A ring built from an empty element string.
    EmptyAtoms,
    /// A chain built from an empty atom list.
    EmptyInput,
    /// An atom in a chain with an empty element string.
    InvalidAtom { index: usize },
    /// A ring number that cannot be written as `d` or `%dd`.
    InvalidRingNumber { got: u16 },
    /// No member ring carries this ring number.
    UnknownRing { ring: u16 },
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPosition { max, got } => {
                write!(f, "position {} is outside 1..={}", got, max)
            }
            Self::InvalidSize { got } => {
                write!(f, "ring size must be at least 3, got {}", got)
            }
            Self::EmptyAtoms => write!(f, "ring atom element is empty"),
            Self::EmptyInput => write!(f, "chain has no atoms"),
            Self::InvalidAtom { index } => write!(f, "atom {} has an empty element", index),
            Self::InvalidRingNumber { got } => {
                write!(f, "ring number {} cannot be written (use 0..=99)", got)
            }
            Self::UnknownRing { ring } => write!(f, "no member ring numbered {}", ring),
        }
    }
}

impl std::error::Error for UsageError {}

/// Shape violations when composing fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    /// A fused system with an unsupported number of member rings.
    TooFewRings { got: usize },
    /// A fused-ring member that is not a ring.
    NonRingMember { index: usize },
    /// A combination the builder does not implement.
    NotSupported { feature: &'static str },
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewRings { got } => {
                write!(f, "unsupported member count {} for a fused ring system", got)
            }
            Self::NonRingMember { index } => {
                write!(f, "fused ring member {} is not a ring", index)
            }
            Self::NotSupported { feature } => write!(f, "not supported: {}", feature),
        }
    }
}

impl std::error::Error for StructuralError {}

/// Any error surfaced by this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Syntax(SyntaxError),
    Structural(StructuralError),
    Usage(UsageError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(e) => write!(f, "{}", e),
            Self::Structural(e) => write!(f, "{}", e),
            Self::Usage(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Syntax(e) => Some(e),
            Self::Structural(e) => Some(e),
            Self::Usage(e) => Some(e),
        }
    }
}

impl From<SyntaxError> for Error {
    fn from(e: SyntaxError) -> Self {
        Self::Syntax(e)
    }
}

impl From<StructuralError> for Error {
    fn from(e: StructuralError) -> Self {
        Self::Structural(e)
    }
}

impl From<UsageError> for Error {
    fn from(e: UsageError) -> Self {
        Self::Usage(e)
    }
}

/// Validates a 1-based position against `1..=max`.
pub(crate) fn check_position(position: usize, max: usize) -> Result<(), UsageError> {
    if position == 0 || position > max {
        return Err(UsageError::InvalidPosition { max, got: position });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn families_wrap_and_chain() {
        let err: Error = UsageError::InvalidPosition { max: 6, got: 7 }.into();
        assert_eq!(err.to_string(), "position 7 is outside 1..=6");
        assert!(err.source().is_some());
    }

    #[test]
    fn position_bounds() {
        assert!(check_position(1, 3).is_ok());
        assert!(check_position(3, 3).is_ok());
        assert_eq!(
            check_position(0, 3),
            Err(UsageError::InvalidPosition { max: 3, got: 0 })
        );
        assert!(check_position(4, 3).is_err());
    }
}
