use std::collections::BTreeMap;

use crate::bond::Bond;
use crate::rings::ring_path;
use crate::smiles::error::SyntaxError;
use crate::smiles::tokenizer::Token;

/// One atom of the flat list built by the first parsing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    pub index: usize,
    /// Element symbol, or the whole bracket text for bracket atoms.
    pub value: String,
    /// Bond glyph written immediately before this atom.
    pub bond: Option<Bond>,
    /// The bond was written before the `(` of the branch this atom opens,
    /// as in `C=(O)C`.
    pub bond_before_paren: bool,
    /// Ring markers written after this atom, in source order.
    pub markers: Vec<AtomMarker>,
    /// Ids of the branches opened off this atom, in source order.
    pub branches: Vec<usize>,
    pub branch_depth: usize,
    /// Char offset of the `(` that opened the innermost enclosing branch.
    pub branch_id: Option<usize>,
    /// The atom the enclosing branch hangs off.
    pub parent_index: Option<usize>,
    pub prev_atom_index: Option<usize>,
    pub after_branch_close: bool,
    pub pos: usize,
}

impl Atom {
    /// Ring numbers opened or closed at this atom, in source order.
    pub fn rings(&self) -> Vec<u16> {
        self.markers.iter().map(|m| m.ring).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomMarker {
    pub ring: u16,
    /// The marker as written: `1` or `%01`.
    pub raw: String,
    pub bond: Option<Bond>,
    /// How many of the atom's branches were written before this marker.
    pub after_branches: usize,
    /// Index into [`AtomList::rings`] of the boundary this marker belongs to.
    pub boundary: usize,
}

/// A matched pair of ring markers and the cycle they close.
///
/// `start` is the lower of the two atom indices. A marker written after a
/// branch closes on the atom before that branch, which may precede the
/// opening atom (`CC(CC1)1`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingBoundary {
    pub ring_number: u16,
    pub start: usize,
    pub end: usize,
    pub branch_depth: usize,
    pub branch_id: Option<usize>,
    pub positions: Vec<usize>,
    pub open_bond: Option<Bond>,
    pub close_bond: Option<Bond>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomList {
    pub atoms: Vec<Atom>,
    pub rings: Vec<RingBoundary>,
}

struct Frame {
    parent_index: usize,
    branch_id: usize,
    atoms: usize,
}

struct OpenRing {
    start: usize,
    bond: Option<Bond>,
    marker: usize,
}

pub fn build_atom_list(tokens: &[Token]) -> Result<AtomList, SyntaxError> {
    let mut atoms: Vec<Atom> = Vec::new();
    let mut rings: Vec<RingBoundary> = Vec::new();
    let mut branch_stack: Vec<Frame> = Vec::new();
    let mut last_atom_at_depth: BTreeMap<usize, usize> = BTreeMap::new();
    let mut branch_closed: BTreeMap<usize, bool> = BTreeMap::new();
    let mut open_rings: BTreeMap<u16, OpenRing> = BTreeMap::new();
    let mut pending_bond: Option<(Bond, usize)> = None;
    let mut bond_before_paren = false;

    for token in tokens {
        let depth = branch_stack.len();
        match token {
            Token::Atom(tok) => {
                let index = atoms.len();
                let frame = branch_stack.last_mut();
                let (parent_index, branch_id) = match frame {
                    Some(f) => {
                        f.atoms += 1;
                        (Some(f.parent_index), Some(f.branch_id))
                    }
                    None => (None, None),
                };
                let bond = pending_bond.take().map(|(b, _)| b);
                atoms.push(Atom {
                    index,
                    value: tok.raw.clone(),
                    bond,
                    bond_before_paren: std::mem::take(&mut bond_before_paren),
                    markers: Vec::new(),
                    branches: Vec::new(),
                    branch_depth: depth,
                    branch_id,
                    parent_index,
                    prev_atom_index: last_atom_at_depth.get(&depth).copied(),
                    after_branch_close: branch_closed.remove(&depth).unwrap_or(false),
                    pos: tok.pos,
                });
                last_atom_at_depth.insert(depth, index);
            }
            Token::Bond { bond, pos } => {
                if pending_bond.is_some() || atoms.is_empty() {
                    return Err(SyntaxError::DanglingBond { pos: *pos });
                }
                pending_bond = Some((*bond, *pos));
            }
            Token::RingMarker {
                bond,
                ring,
                raw,
                pos,
            } => {
                let current = last_atom_at_depth
                    .get(&depth)
                    .copied()
                    .ok_or(SyntaxError::MisplacedRingMarker {
                        pos: *pos,
                        ring: *ring,
                    })?;
                let after_branches = atoms[current].branches.len();
                let boundary = match open_rings.remove(ring) {
                    Some(open) => {
                        if open.start == current {
                            return Err(SyntaxError::MisplacedRingMarker {
                                pos: *pos,
                                ring: *ring,
                            });
                        }
                        let (start, end) = (open.start.min(current), open.start.max(current));
                        let positions = ring_path(&atoms, &rings, start, end);
                        let start_atom = &atoms[start];
                        let id = rings.len();
                        rings.push(RingBoundary {
                            ring_number: *ring,
                            start,
                            end,
                            branch_depth: start_atom.branch_depth,
                            branch_id: start_atom.branch_id,
                            positions,
                            open_bond: open.bond,
                            close_bond: *bond,
                        });
                        atoms[open.start].markers[open.marker].boundary = id;
                        id
                    }
                    None => {
                        open_rings.insert(
                            *ring,
                            OpenRing {
                                start: current,
                                bond: *bond,
                                marker: atoms[current].markers.len(),
                            },
                        );
                        usize::MAX
                    }
                };
                atoms[current].markers.push(AtomMarker {
                    ring: *ring,
                    raw: raw.clone(),
                    bond: *bond,
                    after_branches,
                    boundary,
                });
            }
            Token::BranchOpen(pos) => {
                let parent_index = last_atom_at_depth
                    .get(&depth)
                    .copied()
                    .ok_or(SyntaxError::MisplacedBranch { pos: *pos })?;
                atoms[parent_index].branches.push(*pos);
                bond_before_paren = pending_bond.is_some();
                branch_stack.push(Frame {
                    parent_index,
                    branch_id: *pos,
                    atoms: 0,
                });
                last_atom_at_depth.remove(&(depth + 1));
                branch_closed.remove(&(depth + 1));
            }
            Token::BranchClose(pos) => {
                if let Some((_, bond_pos)) = pending_bond {
                    return Err(SyntaxError::DanglingBond { pos: bond_pos });
                }
                let frame = branch_stack
                    .pop()
                    .ok_or(SyntaxError::UnmatchedParen { pos: *pos })?;
                if frame.atoms == 0 {
                    return Err(SyntaxError::EmptyBranch {
                        pos: frame.branch_id,
                    });
                }
                branch_closed.insert(depth - 1, true);
            }
            Token::Dot(pos) => return Err(SyntaxError::Disconnected { pos: *pos }),
        }
    }

    if let Some((_, pos)) = pending_bond {
        return Err(SyntaxError::DanglingBond { pos });
    }
    if let Some(frame) = branch_stack.last() {
        return Err(SyntaxError::UnclosedBranch {
            pos: frame.branch_id,
        });
    }
    if !open_rings.is_empty() {
        return Err(SyntaxError::UnclosedRing {
            rings: open_rings.keys().copied().collect(),
        });
    }

    Ok(AtomList { atoms, rings })
}
