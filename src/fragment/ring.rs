use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::arbiter;
use crate::bond::Bond;
use crate::codegen;
use crate::error::{check_position, UsageError};
use crate::fragment::metadata::ParserMetadata;
use crate::fragment::{FusedRing, Fragment};

/// Parameters for [`Ring::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct RingSpec {
    pub atoms: String,
    pub size: usize,
    pub ring_number: u16,
    pub offset: usize,
    pub substitutions: BTreeMap<usize, String>,
    pub attachments: BTreeMap<usize, Vec<Fragment>>,
    pub bonds: Vec<Option<Bond>>,
}

impl RingSpec {
    pub fn new(atoms: &str, size: usize) -> Self {
        Self {
            atoms: atoms.to_string(),
            size,
            ..Self::default()
        }
    }

    pub fn ring_number(mut self, ring_number: u16) -> Self {
        self.ring_number = ring_number;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn substitution(mut self, position: usize, element: &str) -> Self {
        self.substitutions.insert(position, element.to_string());
        self
    }

    pub fn attachment(mut self, position: usize, fragment: impl Into<Fragment>) -> Self {
        self.attachments
            .entry(position)
            .or_default()
            .push(fragment.into());
        self
    }

    pub fn bonds(mut self, bonds: Vec<Option<Bond>>) -> Self {
        self.bonds = bonds;
        self
    }
}

impl Default for RingSpec {
    fn default() -> Self {
        Self {
            atoms: String::new(),
            size: 0,
            ring_number: 1,
            offset: 0,
            substitutions: BTreeMap::new(),
            attachments: BTreeMap::new(),
            bonds: Vec::new(),
        }
    }
}

/// A single ring of `size` atoms sharing one base element.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    pub(crate) atoms: String,
    pub(crate) size: usize,
    pub(crate) ring_number: u16,
    pub(crate) offset: usize,
    pub(crate) substitutions: BTreeMap<usize, String>,
    pub(crate) attachments: BTreeMap<usize, Vec<Fragment>>,
    /// `bonds[i]` joins positions `i + 1` and `i + 2`; the last slot is the
    /// ring-closure bond.
    pub(crate) bonds: Vec<Option<Bond>>,
    pub(crate) leading_bond: Option<Bond>,
    pub(crate) bond_before_paren: bool,
    pub(crate) metadata: Option<Arc<ParserMetadata>>,
}

impl Ring {
    pub fn new(spec: RingSpec) -> Result<Self, UsageError> {
        if spec.size < 3 {
            return Err(UsageError::InvalidSize { got: spec.size });
        }
        if spec.atoms.is_empty() {
            return Err(UsageError::EmptyAtoms);
        }
        if spec.ring_number > 99 {
            return Err(UsageError::InvalidRingNumber {
                got: spec.ring_number,
            });
        }
        for &position in spec.substitutions.keys().chain(spec.attachments.keys()) {
            check_position(position, spec.size)?;
        }
        if spec.bonds.len() > spec.size {
            return Err(UsageError::InvalidPosition {
                max: spec.size,
                got: spec.bonds.len(),
            });
        }

        let mut bonds = spec.bonds;
        bonds.resize(spec.size, None);
        let substitutions = spec
            .substitutions
            .into_iter()
            .filter(|(_, element)| *element != spec.atoms)
            .collect();

        Ok(Self {
            atoms: spec.atoms,
            size: spec.size,
            ring_number: spec.ring_number,
            offset: spec.offset,
            substitutions,
            attachments: spec.attachments,
            bonds,
            leading_bond: None,
            bond_before_paren: false,
            metadata: None,
        })
    }

    pub fn base_atom(&self) -> &str {
        &self.atoms
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn ring_number(&self) -> u16 {
        self.ring_number
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Element at a 1-based position.
    pub fn atom_at(&self, position: usize) -> Option<&str> {
        if position == 0 || position > self.size {
            return None;
        }
        Some(
            self.substitutions
                .get(&position)
                .map(String::as_str)
                .unwrap_or(&self.atoms),
        )
    }

    pub fn substitutions(&self) -> &BTreeMap<usize, String> {
        &self.substitutions
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

    pub fn bonds(&self) -> &[Option<Bond>] {
        &self.bonds
    }

    pub fn closure_bond(&self) -> Option<Bond> {
        self.bonds.last().copied().flatten()
    }

    pub fn leading_bond(&self) -> Option<Bond> {
        self.leading_bond
    }

    pub fn bond_before_paren(&self) -> bool {
        self.bond_before_paren
    }

    pub fn has_metadata(&self) -> bool {
        self.metadata.is_some()
    }

    pub fn metadata(&self) -> Option<&ParserMetadata> {
        self.metadata.as_deref()
    }

    pub fn smiles(&self) -> String {
        codegen::write_ring(self)
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

    pub fn substitute(&self, position: usize, element: &str) -> Result<Self, UsageError> {
        check_position(position, self.size)?;
        let mut next = self.clone();
        if element == self.atoms {
            next.substitutions.remove(&position);
        } else {
            next.substitutions.insert(position, element.to_string());
        }
        Ok(next)
    }

    pub fn substitute_multiple<'a>(
        &self,
        substitutions: impl IntoIterator<Item = (usize, &'a str)>,
    ) -> Result<Self, UsageError> {
        let mut next = self.clone();
        for (position, element) in substitutions {
            next = next.substitute(position, element)?;
        }
        Ok(next)
    }

    /// Appends `sub` to the attachments at `position`, renumbering any of
    /// its ring markers that collide with this ring's.
    pub fn attach(&self, sub: impl Into<Fragment>, position: usize) -> Result<Self, UsageError> {
        check_position(position, self.size)?;
        let sub = arbiter::arbitrate(&self.ring_numbers(), &sub.into())?;
        let mut next = self.clone();
        next.attachments.entry(position).or_default().push(sub);
        Ok(next)
    }

    /// Fuses `other` onto this ring, sharing base positions `offset + 1`
    /// and `offset + 2`.
    pub fn fuse(&self, other: &Ring, offset: usize) -> Result<FusedRing, UsageError> {
        let max = self.size.saturating_sub(2);
        if offset > max {
            return Err(UsageError::InvalidPosition { max, got: offset });
        }
        let guest = Fragment::from(other.clone());
        let guest = match arbiter::arbitrate(&self.ring_numbers(), &guest)? {
            Fragment::Ring(ring) => ring.as_ref().clone(),
            _ => other.clone(),
        };
        Ok(FusedRing::from_members(
            vec![self.without_metadata(), guest.without_metadata().with_offset(offset)],
            self.leading_bond,
        ))
    }

    /// Every ring number this ring and its attachments write.
    pub fn ring_numbers(&self) -> BTreeSet<u16> {
        let mut numbers = BTreeSet::from([self.ring_number]);
        for frag in self.attachments.values().flatten() {
            numbers.extend(frag.ring_numbers());
        }
        if let Some(meta) = &self.metadata {
            for frag in meta.seq_atom_attachments.values().flatten() {
                numbers.extend(frag.ring_numbers());
            }
        }
        numbers
    }

    pub(crate) fn with_ring_number(&self, ring_number: u16) -> Self {
        Self {
            ring_number,
            ..self.clone()
        }
    }

    pub(crate) fn with_offset(&self, offset: usize) -> Self {
        Self {
            offset,
            ..self.clone()
        }
    }

    pub(crate) fn with_metadata(&self, metadata: ParserMetadata) -> Self {
        Self {
            metadata: Some(Arc::new(metadata)),
            ..self.clone()
        }
    }

    pub(crate) fn without_metadata(&self) -> Self {
        Self {
            metadata: None,
            ..self.clone()
        }
    }

    pub(crate) fn map_attachments(&self, f: &impl Fn(&Fragment) -> Fragment) -> Self {
        let mut next = self.clone();
        for frags in next.attachments.values_mut() {
            for frag in frags.iter_mut() {
                *frag = f(frag);
            }
        }
        next.metadata = self
            .metadata
            .as_ref()
            .map(|meta| Arc::new(meta.map_attachments(f)));
        next
    }

    pub(crate) fn remap_rings(&self, map: &BTreeMap<u16, u16>) -> Self {
        let mut next = self.map_attachments(&|frag: &Fragment| frag.remap_rings(map));
        if let Some(&to) = map.get(&self.ring_number) {
            next.ring_number = to;
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::Linear;

    fn benzene() -> Ring {
        Ring::new(RingSpec::new("c", 6)).unwrap()
    }

    #[test]
    fn plain_ring() {
        assert_eq!(benzene().smiles(), "c1ccccc1");
        assert_eq!(benzene().size(), 6);
        assert_eq!(benzene().ring_number(), 1);
    }

    #[test]
    fn substitution_at_position_one() {
        let pyridine = benzene().substitute(1, "n").unwrap();
        assert_eq!(pyridine.smiles(), "n1ccccc1");
        assert_eq!(pyridine.atom_at(1), Some("n"));
        assert_eq!(pyridine.atom_at(2), Some("c"));
    }

    #[test]
    fn substituting_the_base_element_removes_the_entry() {
        let pyridine = benzene().substitute(3, "n").unwrap();
        let back = pyridine.substitute(3, "c").unwrap();
        assert!(back.substitutions().is_empty());
        assert_eq!(back.smiles(), "c1ccccc1");
    }

    #[test]
    fn substitute_multiple_applies_each() {
        let pyrimidine = benzene()
            .substitute_multiple([(1, "n"), (3, "n")])
            .unwrap();
        assert_eq!(pyrimidine.smiles(), "n1cnccc1");
    }

    #[test]
    fn attach_in_the_middle() {
        let toluene = benzene()
            .attach(Linear::new(&["C"]).unwrap(), 4)
            .unwrap();
        assert_eq!(toluene.smiles(), "c1ccc(C)cc1");
    }

    #[test]
    fn attachments_keep_insertion_order() {
        let methyl = Linear::new(&["C"]).unwrap();
        let hydroxyl = Linear::new(&["O"]).unwrap();
        let ring = benzene().attach(methyl, 2).unwrap().attach(hydroxyl, 2).unwrap();
        assert_eq!(ring.smiles(), "c1c(C)(O)cccc1");
    }

    #[test]
    fn attach_renumbers_colliding_rings() {
        let ring = benzene().attach(benzene(), 1).unwrap();
        assert_eq!(ring.smiles(), "c1(c2ccccc2)ccccc1");
    }

    #[test]
    fn operations_do_not_mutate_the_receiver() {
        let ring = benzene();
        let before = ring.smiles();
        let _ = ring.substitute(1, "n").unwrap();
        let _ = ring.attach(Linear::new(&["C"]).unwrap(), 2).unwrap();
        assert_eq!(ring.smiles(), before);
    }

    #[test]
    fn validation() {
        assert_eq!(
            Ring::new(RingSpec::new("C", 2)),
            Err(UsageError::InvalidSize { got: 2 })
        );
        assert_eq!(Ring::new(RingSpec::new("", 6)), Err(UsageError::EmptyAtoms));
        assert_eq!(
            Ring::new(RingSpec::new("C", 6).substitution(7, "N")),
            Err(UsageError::InvalidPosition { max: 6, got: 7 })
        );
        assert_eq!(
            benzene().substitute(0, "n"),
            Err(UsageError::InvalidPosition { max: 6, got: 0 })
        );
        assert_eq!(
            Ring::new(RingSpec::new("C", 6).ring_number(100)),
            Err(UsageError::InvalidRingNumber { got: 100 })
        );
    }

    #[test]
    fn explicit_bonds() {
        let double = Some(Bond::Double);
        let ring = Ring::new(RingSpec::new("C", 6).bonds(vec![double, None, double, None, double]))
            .unwrap();
        assert_eq!(ring.smiles(), "C1=CC=CC=C1");
    }

    #[test]
    fn closure_bond_sits_before_the_closing_marker() {
        let ring = Ring::new(
            RingSpec::new("C", 6).bonds(vec![None, None, None, None, None, Some(Bond::Double)]),
        )
        .unwrap();
        assert_eq!(ring.smiles(), "C1CCCCC=1");
    }

    #[test]
    fn two_digit_ring_numbers() {
        let ring = Ring::new(RingSpec::new("C", 3).ring_number(12)).unwrap();
        assert_eq!(ring.smiles(), "C%12CC%12");
    }
}
