use std::collections::BTreeMap;

use petgraph::graph::NodeIndex;

use crate::error::{Error, StructuralError, UsageError};
use crate::fragment::{FusedRing, Fragment, Linear, RawFragment, Ring, RingSpec};
use crate::graph::{to_graph, write_rooted};
use crate::smiles::parse_atoms;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FusedRingsOptions {
    /// Element overrides keyed by `(ring, atom)`, both 0-based.
    pub hetero: BTreeMap<(usize, usize), String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttachOptions {
    /// Re-root a fused-ring substituent so that its atom `at` (0-based, in
    /// written order) is the one bonded to the host.
    pub at: Option<usize>,
}

/// What [`FusedRings::attach_at`] accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Substituent {
    Fragment(Fragment),
    FusedRings(FusedRings),
}

impl From<Fragment> for Substituent {
    fn from(value: Fragment) -> Self {
        Substituent::Fragment(value)
    }
}

impl From<Linear> for Substituent {
    fn from(value: Linear) -> Self {
        Substituent::Fragment(value.into())
    }
}

impl From<Ring> for Substituent {
    fn from(value: Ring) -> Self {
        Substituent::Fragment(value.into())
    }
}

impl From<RawFragment> for Substituent {
    fn from(value: RawFragment) -> Self {
        Substituent::Fragment(value.into())
    }
}

impl From<FusedRings> for Substituent {
    fn from(value: FusedRings) -> Self {
        Substituent::FusedRings(value)
    }
}

/// A two-ring fused system addressed by `[ring, atom]` pairs.
///
/// Ring 0 is numbered 1 and ring 1 is numbered 2; the second ring shares
/// the first ring's atoms 3 and 4 from its end, so two six-membered rings
/// give the naphthalene layout `c1ccc2ccccc2c1`.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedRings {
    sizes: [usize; 2],
    fused: FusedRing,
}

impl FusedRings {
    pub fn new(sizes: &[usize], base: &str, options: FusedRingsOptions) -> Result<Self, Error> {
        let &[first, second] = sizes else {
            return Err(StructuralError::TooFewRings { got: sizes.len() }.into());
        };
        let base_ring = Ring::new(RingSpec::new(base, first))?;
        let other = Ring::new(RingSpec::new(base, second).ring_number(2))?;
        let mut fused = base_ring.fuse(&other, first - 3)?;
        for (&(ring, atom), element) in &options.hetero {
            fused = fused.substitute_in_ring(Self::ring_number(ring)?, atom + 1, element)?;
        }
        Ok(Self {
            sizes: [first, second],
            fused,
        })
    }

    pub fn sizes(&self) -> [usize; 2] {
        self.sizes
    }

    pub fn fused_ring(&self) -> &FusedRing {
        &self.fused
    }

    pub fn to_fragment(&self) -> Fragment {
        self.fused.clone().into()
    }

    pub fn smiles(&self) -> String {
        self.fused.smiles()
    }

    /// Attaches `sub` to atom `site[1]` of ring `site[0]`.
    pub fn attach_at(
        &self,
        site: [usize; 2],
        sub: impl Into<Substituent>,
        options: AttachOptions,
    ) -> Result<Self, Error> {
        let [ring, atom] = site;
        let ring_number = Self::ring_number(ring)?;
        let sub = match (sub.into(), options.at) {
            (Substituent::Fragment(frag), None) => frag,
            (Substituent::FusedRings(rings), None) => rings.to_fragment(),
            (Substituent::FusedRings(rings), Some(at)) => rings.rooted_at(at)?.into(),
            (Substituent::Fragment(_), Some(_)) => {
                return Err(StructuralError::NotSupported {
                    feature: "AttachOptions::at on a substituent that is not FusedRings",
                }
                .into())
            }
        };
        Ok(Self {
            sizes: self.sizes,
            fused: self.fused.attach_to_ring(ring_number, sub, atom + 1)?,
        })
    }

    /// The same system written starting from atom `at`.
    pub fn rooted_at(&self, at: usize) -> Result<RawFragment, Error> {
        let smiles = self.smiles();
        let list = parse_atoms(&smiles)?;
        if at >= list.atoms.len() {
            return Err(UsageError::InvalidPosition {
                max: list.atoms.len(),
                got: at + 1,
            }
            .into());
        }
        let graph = to_graph(&list);
        Ok(RawFragment::new(write_rooted(&graph, NodeIndex::new(at))))
    }

    fn ring_number(ring: usize) -> Result<u16, UsageError> {
        match ring {
            0 => Ok(1),
            1 => Ok(2),
            _ => Err(UsageError::InvalidPosition {
                max: 2,
                got: ring + 1,
            }),
        }
    }
}
