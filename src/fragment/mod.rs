mod dump;
mod fused;
mod fused_rings;
mod linear;
pub mod metadata;
mod molecule;
mod raw;
mod ring;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::bond::Bond;
use crate::codegen;
use crate::error::StructuralError;

pub use fused::{FusedRing, FusedRingOptions};
pub use fused_rings::{AttachOptions, FusedRings, FusedRingsOptions, Substituent};
pub use linear::Linear;
pub use metadata::ParserMetadata;
pub use molecule::{Join, Molecule};
pub use raw::RawFragment;
pub use ring::{Ring, RingSpec};

/// A node of the fragment tree. Nodes are immutable and shared; every
/// operation returns a new fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Linear(Arc<Linear>),
    Ring(Arc<Ring>),
    FusedRing(Arc<FusedRing>),
    Molecule(Arc<Molecule>),
    Raw(Arc<RawFragment>),
}

impl Fragment {
    pub fn smiles(&self) -> String {
        codegen::write(self)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Fragment::Linear(_) => "Linear",
            Fragment::Ring(_) => "Ring",
            Fragment::FusedRing(_) => "FusedRing",
            Fragment::Molecule(_) => "Molecule",
            Fragment::Raw(_) => "RawFragment",
        }
    }

    /// Bond written before this fragment when it follows or hangs off
    /// another one.
    pub fn leading_bond(&self) -> Option<Bond> {
        match self {
            Fragment::Linear(l) => l.leading_bond,
            Fragment::Ring(r) => r.leading_bond,
            Fragment::FusedRing(f) => f.leading_bond,
            Fragment::Molecule(m) => m.leading_bond(),
            Fragment::Raw(r) => r.leading_bond,
        }
    }

    pub fn with_leading_bond(&self, bond: Option<Bond>) -> Fragment {
        match self {
            Fragment::Linear(l) => l.with_leading_bond(bond).into(),
            Fragment::Ring(r) => r.with_leading_bond(bond).into(),
            Fragment::FusedRing(f) => f.with_leading_bond(bond).into(),
            Fragment::Molecule(m) => m.with_leading_bond(bond).into(),
            Fragment::Raw(r) => r.with_leading_bond(bond).into(),
        }
    }

    /// Whether the leading bond is written before the `(` of the branch
    /// holding this fragment (`C=(O)C`) rather than inside it (`C(=O)C`).
    pub fn bond_before_paren(&self) -> bool {
        match self {
            Fragment::Linear(l) => l.bond_before_paren,
            Fragment::Ring(r) => r.bond_before_paren,
            Fragment::FusedRing(f) => f.bond_before_paren,
            Fragment::Molecule(m) => m.bond_before_paren(),
            Fragment::Raw(r) => r.bond_before_paren,
        }
    }

    pub fn with_bond_before_paren(&self, before: bool) -> Fragment {
        match self {
            Fragment::Linear(l) => l.with_bond_before_paren(before).into(),
            Fragment::Ring(r) => r.with_bond_before_paren(before).into(),
            Fragment::FusedRing(f) => f.with_bond_before_paren(before).into(),
            Fragment::Molecule(m) => m.with_bond_before_paren(before).into(),
            Fragment::Raw(r) => r.with_bond_before_paren(before).into(),
        }
    }

    /// Every ring number written anywhere in this fragment.
    pub fn ring_numbers(&self) -> BTreeSet<u16> {
        match self {
            Fragment::Linear(l) => l.ring_numbers(),
            Fragment::Ring(r) => r.ring_numbers(),
            Fragment::FusedRing(f) => f.ring_numbers(),
            Fragment::Molecule(m) => m.ring_numbers(),
            Fragment::Raw(r) => r.ring_numbers(),
        }
    }

    /// Rewrites ring numbers through `map`; numbers not in the map are kept.
    pub fn remap_rings(&self, map: &BTreeMap<u16, u16>) -> Fragment {
        if map.is_empty() {
            return self.clone();
        }
        match self {
            Fragment::Linear(l) => l
                .map_attachments(&|frag: &Fragment| frag.remap_rings(map))
                .into(),
            Fragment::Ring(r) => r.remap_rings(map).into(),
            Fragment::FusedRing(f) => f.remap_rings(map).into(),
            Fragment::Molecule(m) => m.map_components(|frag| frag.remap_rings(map)).into(),
            Fragment::Raw(r) => RawFragment {
                smiles: crate::arbiter::remap_smiles(&r.smiles, map),
                leading_bond: r.leading_bond,
                bond_before_paren: r.bond_before_paren,
            }
            .into(),
        }
    }

    /// Copies every owned node, so the result shares nothing with `self`.
    pub fn deep_clone(&self) -> Fragment {
        let copy = |frag: &Fragment| frag.deep_clone();
        match self {
            Fragment::Linear(l) => l.map_attachments(&copy).into(),
            Fragment::Ring(r) => r.map_attachments(&copy).into(),
            Fragment::FusedRing(f) => f.map_attachments(&copy).into(),
            Fragment::Molecule(m) => m.map_components(copy).into(),
            Fragment::Raw(r) => r.as_ref().clone().into(),
        }
    }

    /// Attaches `sub` at a 1-based position of a chain or ring.
    pub fn attach(
        &self,
        sub: impl Into<Fragment>,
        position: usize,
    ) -> Result<Fragment, crate::Error> {
        match self {
            Fragment::Linear(l) => Ok(l.attach(sub, position)?.into()),
            Fragment::Ring(r) => Ok(r.attach(sub, position)?.into()),
            _ => Err(StructuralError::NotSupported {
                feature: "attach on a fragment that is not a Linear or Ring",
            }
            .into()),
        }
    }

    pub fn concat(&self, other: &Fragment) -> Fragment {
        match self {
            Fragment::Linear(l) => l.concat(other),
            _ => Molecule::new(vec![self.clone(), other.clone()]).into(),
        }
    }

    pub fn as_linear(&self) -> Option<&Linear> {
        match self {
            Fragment::Linear(l) => Some(l.as_ref()),
            _ => None,
        }
    }

    pub fn as_ring(&self) -> Option<&Ring> {
        match self {
            Fragment::Ring(r) => Some(r.as_ref()),
            _ => None,
        }
    }

    pub fn as_fused_ring(&self) -> Option<&FusedRing> {
        match self {
            Fragment::FusedRing(f) => Some(f.as_ref()),
            _ => None,
        }
    }

    pub fn as_molecule(&self) -> Option<&Molecule> {
        match self {
            Fragment::Molecule(m) => Some(m.as_ref()),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&RawFragment> {
        match self {
            Fragment::Raw(r) => Some(r.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.smiles())
    }
}

impl From<Linear> for Fragment {
    fn from(value: Linear) -> Self {
        Fragment::Linear(Arc::new(value))
    }
}

impl From<Ring> for Fragment {
    fn from(value: Ring) -> Self {
        Fragment::Ring(Arc::new(value))
    }
}

impl From<FusedRing> for Fragment {
    fn from(value: FusedRing) -> Self {
        Fragment::FusedRing(Arc::new(value))
    }
}

impl From<Molecule> for Fragment {
    fn from(value: Molecule) -> Self {
        Fragment::Molecule(Arc::new(value))
    }
}

impl From<RawFragment> for Fragment {
    fn from(value: RawFragment) -> Self {
        Fragment::Raw(Arc::new(value))
    }
}
