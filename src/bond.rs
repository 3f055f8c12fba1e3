use std::fmt;

use serde::{Deserialize, Serialize};

/// A bond glyph as written in SMILES. Absence of a glyph is modelled as
/// `Option<Bond>::None`; no implicit bond is ever synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bond {
    #[serde(rename = "-")]
    Single,
    #[serde(rename = "=")]
    Double,
    #[serde(rename = "#")]
    Triple,
    #[serde(rename = ":")]
    Aromatic,
    #[serde(rename = "/")]
    Up,
    #[serde(rename = "\\")]
    Down,
}

impl Bond {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '-' => Some(Self::Single),
            '=' => Some(Self::Double),
            '#' => Some(Self::Triple),
            ':' => Some(Self::Aromatic),
            '/' => Some(Self::Up),
            '\\' => Some(Self::Down),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Single => '-',
            Self::Double => '=',
            Self::Triple => '#',
            Self::Aromatic => ':',
            Self::Up => '/',
            Self::Down => '\\',
        }
    }

    /// Rust expression that reconstructs this bond, used by `to_code`.
    pub(crate) fn code_name(self) -> &'static str {
        match self {
            Self::Single => "Bond::Single",
            Self::Double => "Bond::Double",
            Self::Triple => "Bond::Triple",
            Self::Aromatic => "Bond::Aromatic",
            Self::Up => "Bond::Up",
            Self::Down => "Bond::Down",
        }
    }
}

impl fmt::Display for Bond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyphs_map_both_ways() {
        for c in ['-', '=', '#', ':', '/', '\\'] {
            let bond = Bond::from_char(c).unwrap();
            assert_eq!(bond.as_char(), c);
        }
        assert_eq!(Bond::from_char('.'), None);
    }

    #[test]
    fn serializes_as_glyph() {
        assert_eq!(serde_json::to_string(&Bond::Double).unwrap(), "\"=\"");
        let back: Bond = serde_json::from_str("\"\\\\\"").unwrap();
        assert_eq!(back, Bond::Down);
    }
}
