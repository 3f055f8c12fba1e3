use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::arbiter;
use crate::bond::Bond;
use crate::codegen;
use crate::error::{check_position, Error, StructuralError, UsageError};
use crate::fragment::metadata::ParserMetadata;
use crate::fragment::{Fragment, Ring};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FusedRingOptions {
    pub leading_bond: Option<Bond>,
}

/// Two or more rings sharing atoms. The first ring is the base; every other
/// member shares base positions `offset + 1` and `offset + 2`.
///
/// Parsed groups may also carry sequential rings (written inline with the
/// group without sharing atoms) and the metadata that reproduces the source
/// layout.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedRing {
    pub(crate) rings: Vec<Ring>,
    pub(crate) sequential: Vec<Ring>,
    pub(crate) leading_bond: Option<Bond>,
    pub(crate) bond_before_paren: bool,
    pub(crate) metadata: Option<Arc<ParserMetadata>>,
}

impl FusedRing {
    pub fn new(rings: Vec<Fragment>, options: FusedRingOptions) -> Result<Self, Error> {
        if rings.len() < 2 {
            return Err(StructuralError::TooFewRings { got: rings.len() }.into());
        }
        let members = rings
            .iter()
            .enumerate()
            .map(|(index, frag)| match frag {
                Fragment::Ring(ring) => Ok(ring.as_ref().clone()),
                _ => Err(StructuralError::NonRingMember { index }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut fused = Self::from_rings(members)?;
        fused.leading_bond = options.leading_bond;
        Ok(fused)
    }

    /// Builds a fused system from typed rings, renumbering members whose
    /// ring number is already taken by an earlier one.
    pub fn from_rings(rings: Vec<Ring>) -> Result<Self, Error> {
        if rings.len() < 2 {
            return Err(StructuralError::TooFewRings { got: rings.len() }.into());
        }
        let mut used: BTreeSet<u16> = rings.iter().flat_map(Ring::ring_numbers).collect();
        let mut seen = BTreeSet::new();
        let mut members = Vec::with_capacity(rings.len());
        for ring in rings {
            let ring = if seen.contains(&ring.ring_number) {
                let free = arbiter::next_free(&used).ok_or(UsageError::InvalidRingNumber {
                    got: arbiter::MAX_RING_NUMBER + 1,
                })?;
                used.insert(free);
                ring.with_ring_number(free)
            } else {
                ring
            };
            seen.insert(ring.ring_number);
            members.push(ring.without_metadata());
        }
        Ok(Self::from_members(members, None))
    }

    pub(crate) fn from_members(rings: Vec<Ring>, leading_bond: Option<Bond>) -> Self {
        Self {
            rings,
            sequential: Vec::new(),
            leading_bond,
            bond_before_paren: false,
            metadata: None,
        }
    }

    pub(crate) fn from_parsed(
        rings: Vec<Ring>,
        sequential: Vec<Ring>,
        metadata: ParserMetadata,
    ) -> Self {
        Self {
            rings,
            sequential,
            leading_bond: None,
            bond_before_paren: false,
            metadata: Some(Arc::new(metadata)),
        }
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    pub fn sequential_rings(&self) -> &[Ring] {
        &self.sequential
    }

    pub fn base(&self) -> &Ring {
        &self.rings[0]
    }

    pub fn metadata(&self) -> Option<&ParserMetadata> {
        self.metadata.as_deref()
    }

    pub fn has_metadata(&self) -> bool {
        self.metadata.is_some()
    }

    pub fn leading_bond(&self) -> Option<Bond> {
        self.leading_bond
    }

    pub fn bond_before_paren(&self) -> bool {
        self.bond_before_paren
    }

    pub fn total_atoms(&self) -> usize {
        if let Some(meta) = &self.metadata {
            return meta.all_positions.len();
        }
        let fused: usize = self.rings[1..].iter().map(|r| r.size - 2).sum();
        let sequential: usize = self.sequential.iter().map(|r| r.size).sum();
        self.rings[0].size + fused + sequential
    }

    pub fn smiles(&self) -> String {
        codegen::write_fused(self)
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

    /// Fuses one more ring onto the base at `offset`. The recorded parse
    /// layout no longer applies afterwards and is dropped.
    pub fn add_ring(&self, ring: &Ring, offset: usize) -> Result<Self, UsageError> {
        let max = self.rings[0].size.saturating_sub(2);
        if offset > max || self.rings[1..].iter().any(|r| r.offset == offset) {
            return Err(UsageError::InvalidPosition { max, got: offset });
        }
        let guest = match arbiter::arbitrate(&self.ring_numbers(), &ring.clone().into())? {
            Fragment::Ring(r) => r.as_ref().clone(),
            _ => ring.clone(),
        };
        let mut next = self.clone();
        next.rings.push(guest.without_metadata().with_offset(offset));
        next.metadata = None;
        Ok(next)
    }

    pub fn substitute_in_ring(
        &self,
        ring_number: u16,
        position: usize,
        element: &str,
    ) -> Result<Self, UsageError> {
        self.edit_member(ring_number, |ring| ring.substitute(position, element))
    }

    pub fn attach_to_ring(
        &self,
        ring_number: u16,
        sub: impl Into<Fragment>,
        position: usize,
    ) -> Result<Self, UsageError> {
        let index = self.member_index(ring_number)?;
        check_position(position, self.member(index).size)?;
        let sub = arbiter::arbitrate(&self.ring_numbers(), &sub.into())?;
        let mut next = self.clone();
        let ring = next.member_mut(index);
        ring.attachments.entry(position).or_default().push(sub);
        Ok(next)
    }

    /// Renumbers members consecutively from `start` (default 1), base first
    /// and sequential rings last.
    pub fn renumber(&self, start: Option<u16>) -> Result<Self, UsageError> {
        let start = start.unwrap_or(1);
        let count = (self.rings.len() + self.sequential.len()) as u16;
        let last = start.saturating_add(count.saturating_sub(1));
        if last > arbiter::MAX_RING_NUMBER {
            return Err(UsageError::InvalidRingNumber { got: last });
        }
        let mut next = self.clone();
        for (i, ring) in next.rings.iter_mut().chain(next.sequential.iter_mut()).enumerate() {
            ring.ring_number = start + i as u16;
        }
        Ok(next)
    }

    pub fn ring_numbers(&self) -> BTreeSet<u16> {
        let mut numbers: BTreeSet<u16> = self
            .rings
            .iter()
            .chain(&self.sequential)
            .flat_map(Ring::ring_numbers)
            .collect();
        if let Some(meta) = &self.metadata {
            for frag in meta.seq_atom_attachments.values().flatten() {
                numbers.extend(frag.ring_numbers());
            }
        }
        numbers
    }

    /// All members, fused first and sequential after, in metadata order.
    pub(crate) fn members(&self) -> Vec<&Ring> {
        self.rings.iter().chain(&self.sequential).collect()
    }

    pub(crate) fn map_attachments(&self, f: &impl Fn(&Fragment) -> Fragment) -> Self {
        Self {
            rings: self.rings.iter().map(|r| r.map_attachments(f)).collect(),
            sequential: self.sequential.iter().map(|r| r.map_attachments(f)).collect(),
            leading_bond: self.leading_bond,
            bond_before_paren: self.bond_before_paren,
            metadata: self
                .metadata
                .as_ref()
                .map(|meta| Arc::new(meta.map_attachments(f))),
        }
    }

    pub(crate) fn remap_rings(&self, map: &BTreeMap<u16, u16>) -> Self {
        let mut next = self.map_attachments(&|frag: &Fragment| frag.remap_rings(map));
        for ring in next.rings.iter_mut().chain(next.sequential.iter_mut()) {
            if let Some(&to) = map.get(&ring.ring_number) {
                ring.ring_number = to;
            }
        }
        next
    }

    fn member_index(&self, ring_number: u16) -> Result<usize, UsageError> {
        self.members()
            .iter()
            .position(|r| r.ring_number == ring_number)
            .ok_or(UsageError::UnknownRing { ring: ring_number })
    }

    fn member(&self, index: usize) -> &Ring {
        match index.checked_sub(self.rings.len()) {
            Some(i) => &self.sequential[i],
            None => &self.rings[index],
        }
    }

    fn member_mut(&mut self, index: usize) -> &mut Ring {
        match index.checked_sub(self.rings.len()) {
            Some(i) => &mut self.sequential[i],
            None => &mut self.rings[index],
        }
    }

    fn edit_member(
        &self,
        ring_number: u16,
        edit: impl FnOnce(&Ring) -> Result<Ring, UsageError>,
    ) -> Result<Self, UsageError> {
        let index = self.member_index(ring_number)?;
        let edited = edit(self.member(index))?;
        let mut next = self.clone();
        *next.member_mut(index) = edited;
        Ok(next)
    }
}
