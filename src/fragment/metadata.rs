use std::collections::BTreeMap;

use crate::bond::Bond;
use crate::fragment::Fragment;

/// Layout of a parsed ring group, recorded so that serialization replays
/// the exact marker order, bond placement and branch nesting of the input.
///
/// Atoms are keyed by their index in the parsed atom list. Member indices
/// address the owning node's rings followed by its sequential rings.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserMetadata {
    pub(crate) root: usize,
    pub(crate) all_positions: Vec<usize>,
    pub(crate) atoms: BTreeMap<usize, InlineAtom>,
    pub(crate) member_paths: Vec<Vec<usize>>,
    pub(crate) seq_atom_attachments: BTreeMap<usize, Vec<Fragment>>,
    pub(crate) ring_slots: BTreeMap<(usize, usize), usize>,
}

/// An atom written inline with a ring group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineAtom {
    pub value: String,
    pub bond: Option<Bond>,
    /// `bond` was written before the `(` of the branch this atom opens.
    pub bond_before_paren: bool,
    pub branch_depth: usize,
    pub branch_id: Option<usize>,
    pub parent_index: Option<usize>,
    pub prev_atom_index: Option<usize>,
    /// Next atom of the same chain, when it is also inline.
    pub next: Option<usize>,
    pub markers: Vec<MarkerSlot>,
    pub branches: Vec<BranchSlot>,
}

/// A ring marker as it was written on an inline atom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSlot {
    pub member: usize,
    pub ring_number: u16,
    pub raw: String,
    pub bond: Option<Bond>,
    pub after_branches: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchSlot {
    /// A branch whose atoms are part of the group; holds its first atom.
    Inline(usize),
    /// A branch serialized from an attachment fragment.
    Attachment(AttachmentSite),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentSite {
    Ring {
        member: usize,
        position: usize,
        slot: usize,
    },
    Atom {
        atom: usize,
        slot: usize,
    },
}

impl ParserMetadata {
    pub fn root(&self) -> usize {
        self.root
    }

    /// Every atom written inline with the group, ascending.
    pub fn all_positions(&self) -> &[usize] {
        &self.all_positions
    }

    pub fn atom(&self, index: usize) -> Option<&InlineAtom> {
        self.atoms.get(&index)
    }

    pub fn member_paths(&self) -> &[Vec<usize>] {
        &self.member_paths
    }

    /// Branch chains hanging off inline atoms that lie on no member ring.
    pub fn seq_atom_attachments(&self) -> &BTreeMap<usize, Vec<Fragment>> {
        &self.seq_atom_attachments
    }

    /// Number of a member's attachments at `position` that came from the
    /// parse; later ones were added by combinators.
    pub(crate) fn recorded_attachments(&self, member: usize, position: usize) -> usize {
        self.ring_slots
            .get(&(member, position))
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn map_attachments(&self, f: impl Fn(&Fragment) -> Fragment) -> Self {
        let mut next = self.clone();
        for frags in next.seq_atom_attachments.values_mut() {
            for frag in frags.iter_mut() {
                *frag = f(frag);
            }
        }
        next
    }
}
