use std::collections::{BTreeMap, BTreeSet};

use crate::arbiter;
use crate::bond::Bond;
use crate::codegen;
use crate::error::{check_position, UsageError};
use crate::fragment::{Fragment, Molecule};

/// An unbranched chain of atoms with optional branch attachments.
#[derive(Debug, Clone, PartialEq)]
pub struct Linear {
    pub(crate) atoms: Vec<String>,
    /// `bonds[i]` joins `atoms[i]` and `atoms[i + 1]`.
    pub(crate) bonds: Vec<Option<Bond>>,
    pub(crate) attachments: BTreeMap<usize, Vec<Fragment>>,
    pub(crate) leading_bond: Option<Bond>,
    pub(crate) bond_before_paren: bool,
}

impl Linear {
    pub fn new(atoms: &[&str]) -> Result<Self, UsageError> {
        Self::with_bonds(atoms, &[])
    }

    pub fn with_bonds(atoms: &[&str], bonds: &[Option<Bond>]) -> Result<Self, UsageError> {
        Self::from_parts(
            atoms.iter().map(|a| a.to_string()).collect(),
            bonds.to_vec(),
            BTreeMap::new(),
        )
    }

    pub fn from_parts(
        atoms: Vec<String>,
        mut bonds: Vec<Option<Bond>>,
        attachments: BTreeMap<usize, Vec<Fragment>>,
    ) -> Result<Self, UsageError> {
        if atoms.is_empty() {
            return Err(UsageError::EmptyInput);
        }
        if let Some(index) = atoms.iter().position(String::is_empty) {
            return Err(UsageError::InvalidAtom { index });
        }
        let slots = atoms.len() - 1;
        if bonds.len() > slots {
            return Err(UsageError::InvalidPosition {
                max: slots,
                got: bonds.len(),
            });
        }
        for &position in attachments.keys() {
            check_position(position, atoms.len())?;
        }
        bonds.resize(slots, None);

        Ok(Self {
            atoms,
            bonds,
            attachments,
            leading_bond: None,
            bond_before_paren: false,
        })
    }

    pub fn atoms(&self) -> &[String] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[Option<Bond>] {
        &self.bonds
    }

    pub fn attachments(&self) -> &BTreeMap<usize, Vec<Fragment>> {
        &self.attachments
    }

    pub fn attachments_at(&self, position: usize) -> &[Fragment] {
        self.attachments
            .get(&position)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn leading_bond(&self) -> Option<Bond> {
        self.leading_bond
    }

    /// Whether the leading bond goes before the `(` when this fragment is
    /// written as a branch.
    pub fn bond_before_paren(&self) -> bool {
        self.bond_before_paren
    }

    pub fn smiles(&self) -> String {
        codegen::write_linear(self)
    }

    pub fn with_leading_bond(&self, bond: Option<Bond>) -> Self {
        Self {
            leading_bond: bond,
            ..self.clone()
        }
    }

    pub fn with_bond_before_paren(&self, before: bool) -> Self {
        Self {
            bond_before_paren: before,
            ..self.clone()
        }
    }

    pub fn attach(&self, sub: impl Into<Fragment>, position: usize) -> Result<Self, UsageError> {
        check_position(position, self.atoms.len())?;
        let sub = arbiter::arbitrate(&self.ring_numbers(), &sub.into())?;
        let mut next = self.clone();
        next.attachments.entry(position).or_default().push(sub);
        Ok(next)
    }

    /// Attaches every fragment of `subs` at `position`, in order.
    pub fn branch(
        &self,
        position: usize,
        subs: impl IntoIterator<Item = Fragment>,
    ) -> Result<Self, UsageError> {
        let mut next = self.clone();
        for sub in subs {
            next = next.attach(sub, position)?;
        }
        Ok(next)
    }

    pub fn branch_at(&self, branches: BTreeMap<usize, Vec<Fragment>>) -> Result<Self, UsageError> {
        for &position in branches.keys() {
            check_position(position, self.atoms.len())?;
        }
        let mut next = self.clone();
        for (position, subs) in branches {
            next = next.branch(position, subs)?;
        }
        Ok(next)
    }

    /// Joins two chains end to end, `other`'s leading bond becoming the
    /// bond between them. Any other pairing yields a two-component molecule.
    pub fn concat(&self, other: &Fragment) -> Fragment {
        let Fragment::Linear(tail) = other else {
            return Molecule::new(vec![Fragment::from(self.clone()), other.clone()]).into();
        };
        let shift = self.atoms.len();
        let mut next = self.clone();
        next.atoms.extend(tail.atoms.iter().cloned());
        next.bonds.push(tail.leading_bond);
        next.bonds.extend(tail.bonds.iter().copied());
        for (&position, frags) in &tail.attachments {
            next.attachments
                .entry(position + shift)
                .or_default()
                .extend(frags.iter().cloned());
        }
        next.into()
    }

    pub fn ring_numbers(&self) -> BTreeSet<u16> {
        self.attachments
            .values()
            .flatten()
            .flat_map(Fragment::ring_numbers)
            .collect()
    }

    pub(crate) fn map_attachments(&self, f: &impl Fn(&Fragment) -> Fragment) -> Self {
        let mut next = self.clone();
        for frags in next.attachments.values_mut() {
            for frag in frags.iter_mut() {
                *frag = f(frag);
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{Ring, RingSpec};

    #[test]
    fn ethanol() {
        let chain = Linear::new(&["C", "C", "O"]).unwrap();
        assert_eq!(chain.smiles(), "CCO");
        assert_eq!(chain.bonds(), &[None, None]);
    }

    #[test]
    fn explicit_bonds_between_atoms() {
        let chain = Linear::with_bonds(
            &["C", "C", "N"],
            &[Some(Bond::Double), Some(Bond::Triple)],
        )
        .unwrap();
        assert_eq!(chain.smiles(), "C=C#N");
    }

    #[test]
    fn sparse_bonds_are_padded() {
        let chain = Linear::with_bonds(&["C", "C", "C"], &[Some(Bond::Double)]).unwrap();
        assert_eq!(chain.bonds(), &[Some(Bond::Double), None]);
        assert_eq!(chain.smiles(), "C=CC");
    }

    #[test]
    fn attachment_is_written_before_the_next_bond() {
        let acid = Linear::with_bonds(&["C", "C", "O"], &[None, None])
            .unwrap()
            .attach(
                Linear::new(&["O"]).unwrap().with_leading_bond(Some(Bond::Double)),
                2,
            )
            .unwrap();
        assert_eq!(acid.smiles(), "CC(=O)O");
    }

    #[test]
    fn branch_and_branch_at() {
        let methyl = Fragment::from(Linear::new(&["C"]).unwrap());
        let neopentane = Linear::new(&["C", "C", "C"])
            .unwrap()
            .branch(2, [methyl.clone(), methyl.clone()])
            .unwrap();
        assert_eq!(neopentane.smiles(), "CC(C)(C)C");

        let mut map = BTreeMap::new();
        map.insert(1, vec![methyl.clone()]);
        map.insert(3, vec![methyl]);
        let chain = Linear::new(&["C", "C", "C"]).unwrap().branch_at(map).unwrap();
        assert_eq!(chain.smiles(), "C(C)CC(C)");
    }

    #[test]
    fn concat_joins_chains() {
        let head = Linear::new(&["C", "C"]).unwrap();
        let tail = Linear::new(&["O"]).unwrap().with_leading_bond(Some(Bond::Double));
        let joined = head.concat(&tail.into());
        assert_eq!(joined.smiles(), "CC=O");
        assert!(matches!(joined, Fragment::Linear(_)));
    }

    #[test]
    fn concat_with_a_ring_makes_a_molecule() {
        let head = Linear::new(&["C"]).unwrap();
        let ring = Ring::new(RingSpec::new("c", 6)).unwrap();
        let joined = head.concat(&ring.into());
        assert!(matches!(joined, Fragment::Molecule(_)));
        assert_eq!(joined.smiles(), "Cc1ccccc1");
    }

    #[test]
    fn validation() {
        assert_eq!(Linear::new(&[]), Err(UsageError::EmptyInput));
        assert_eq!(
            Linear::new(&["C", ""]),
            Err(UsageError::InvalidAtom { index: 1 })
        );
        assert_eq!(
            Linear::new(&["C"]).unwrap().attach(Linear::new(&["O"]).unwrap(), 2),
            Err(UsageError::InvalidPosition { max: 1, got: 2 })
        );
    }
}
