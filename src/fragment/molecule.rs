use std::collections::BTreeSet;

use crate::bond::Bond;
use crate::codegen;
use crate::fragment::Fragment;

/// Records that a component continues the chain of an earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Join {
    /// The component whose first atom continues the chain.
    pub component: usize,
    /// The earlier component holding the atom it bonds to.
    pub previous: usize,
    /// Parsed index of that atom.
    pub atom: usize,
}

/// Components written one after another, without a separator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Molecule {
    pub(crate) components: Vec<Fragment>,
    pub(crate) joins: Vec<Join>,
}

impl Molecule {
    pub fn new(components: Vec<Fragment>) -> Self {
        Self {
            components,
            joins: Vec::new(),
        }
    }

    pub(crate) fn with_joins(components: Vec<Fragment>, joins: Vec<Join>) -> Self {
        Self { components, joins }
    }

    pub fn components(&self) -> &[Fragment] {
        &self.components
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// The bond leading into the first component.
    pub fn leading_bond(&self) -> Option<Bond> {
        self.components.first().and_then(Fragment::leading_bond)
    }

    pub fn with_leading_bond(&self, bond: Option<Bond>) -> Self {
        let mut next = self.clone();
        if let Some(first) = next.components.first_mut() {
            *first = first.with_leading_bond(bond);
        }
        next
    }

    pub fn bond_before_paren(&self) -> bool {
        self.components
            .first()
            .is_some_and(Fragment::bond_before_paren)
    }

    pub fn with_bond_before_paren(&self, before: bool) -> Self {
        let mut next = self.clone();
        if let Some(first) = next.components.first_mut() {
            *first = first.with_bond_before_paren(before);
        }
        next
    }

    pub fn smiles(&self) -> String {
        codegen::write_molecule(self)
    }

    pub fn ring_numbers(&self) -> BTreeSet<u16> {
        self.components
            .iter()
            .flat_map(Fragment::ring_numbers)
            .collect()
    }

    pub(crate) fn map_components(&self, f: impl Fn(&Fragment) -> Fragment) -> Self {
        Self {
            components: self.components.iter().map(f).collect(),
            joins: self.joins.clone(),
        }
    }
}
