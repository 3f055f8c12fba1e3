use std::collections::BTreeSet;

use crate::bond::Bond;
use crate::smiles::{tokenize, Token};

/// Pre-written SMILES carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFragment {
    pub(crate) smiles: String,
    pub(crate) leading_bond: Option<Bond>,
    pub(crate) bond_before_paren: bool,
}

impl RawFragment {
    pub fn new(smiles: impl Into<String>) -> Self {
        Self {
            smiles: smiles.into(),
            leading_bond: None,
            bond_before_paren: false,
        }
    }

    pub fn smiles(&self) -> &str {
        &self.smiles
    }

    pub fn leading_bond(&self) -> Option<Bond> {
        self.leading_bond
    }

    pub fn with_leading_bond(&self, bond: Option<Bond>) -> Self {
        Self {
            leading_bond: bond,
            ..self.clone()
        }
    }

    pub fn bond_before_paren(&self) -> bool {
        self.bond_before_paren
    }

    pub fn with_bond_before_paren(&self, before: bool) -> Self {
        Self {
            bond_before_paren: before,
            ..self.clone()
        }
    }

    /// Ring numbers appearing as markers; empty when the text does not
    /// tokenize.
    pub fn ring_numbers(&self) -> BTreeSet<u16> {
        tokenize(&self.smiles)
            .map(|tokens| {
                tokens
                    .iter()
                    .filter_map(|t| match t {
                        Token::RingMarker { ring, .. } => Some(*ring),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
