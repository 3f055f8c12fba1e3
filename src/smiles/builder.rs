use std::collections::{BTreeMap, BTreeSet};

use log::trace;

use crate::bond::Bond;
use crate::codegen;
use crate::fragment::metadata::{
    AttachmentSite, BranchSlot, InlineAtom, MarkerSlot, ParserMetadata,
};
use crate::fragment::{Fragment, FusedRing, Join, Linear, Molecule, Ring};
use crate::rings::group_rings;
use crate::smiles::atoms::{AtomList, RingBoundary};

/// Second parsing pass: turns the flat atom list into a fragment tree.
///
/// Every chain (the main chain or one branch) is split into linear runs and
/// ring groups. A ring belongs to the innermost branch enclosing both of its
/// ends; branches a ring passes through are written inline with its group,
/// every other branch becomes an attachment.
pub fn build_fragment(list: &AtomList) -> Fragment {
    Builder::new(list).build_chain(None)
}

struct Builder<'a> {
    list: &'a AtomList,
    /// Atoms of each chain in source order, keyed by branch id.
    chains: BTreeMap<Option<usize>, Vec<usize>>,
    chain_pos: Vec<usize>,
    /// Enclosing branch ids per atom, innermost first.
    enclosing: Vec<Vec<usize>>,
    /// Chain each ring boundary is laid out in.
    scopes: Vec<Option<usize>>,
}

impl<'a> Builder<'a> {
    fn new(list: &'a AtomList) -> Self {
        let atoms = &list.atoms;
        let mut chains: BTreeMap<Option<usize>, Vec<usize>> = BTreeMap::new();
        let mut chain_pos = Vec::with_capacity(atoms.len());
        for atom in atoms {
            let chain = chains.entry(atom.branch_id).or_default();
            chain_pos.push(chain.len());
            chain.push(atom.index);
        }

        let enclosing: Vec<Vec<usize>> = (0..atoms.len())
            .map(|index| {
                let mut ids = Vec::new();
                let mut a = index;
                while let Some(id) = atoms[a].branch_id {
                    ids.push(id);
                    match atoms[a].parent_index {
                        Some(p) => a = p,
                        None => break,
                    }
                }
                ids
            })
            .collect();

        let scopes = list
            .rings
            .iter()
            .map(|ring| {
                enclosing[ring.start]
                    .iter()
                    .find(|id| enclosing[ring.end].contains(id))
                    .copied()
            })
            .collect();

        Self {
            list,
            chains,
            chain_pos,
            enclosing,
            scopes,
        }
    }

    fn chain(&self, branch: Option<usize>) -> &[usize] {
        self.chains.get(&branch).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The atom of chain `scope` that `atom` hangs off (or `atom` itself).
    fn anchor(&self, atom: usize, scope: Option<usize>) -> usize {
        let atoms = &self.list.atoms;
        let mut a = atom;
        while atoms[a].branch_id != scope {
            match atoms[a].parent_index {
                Some(p) => a = p,
                None => break,
            }
        }
        a
    }

    /// Branches entered on the way from one end of the ring to the other.
    fn crossed_branches(&self, ring: usize) -> impl Iterator<Item = usize> + '_ {
        let boundary = &self.list.rings[ring];
        let from_start = &self.enclosing[boundary.start];
        let from_end = &self.enclosing[boundary.end];
        from_start
            .iter()
            .filter(|id| !from_end.contains(id))
            .chain(from_end.iter().filter(|id| !from_start.contains(id)))
            .copied()
    }

    fn build_chain(&self, branch: Option<usize>) -> Fragment {
        let chain = self.chain(branch);

        let mut intervals: Vec<(usize, usize)> = self
            .scopes
            .iter()
            .enumerate()
            .filter(|(_, scope)| **scope == branch)
            .map(|(r, _)| {
                let ring = &self.list.rings[r];
                let a = self.chain_pos[self.anchor(ring.start, branch)];
                let b = self.chain_pos[self.anchor(ring.end, branch)];
                (a.min(b), a.max(b))
            })
            .collect();
        intervals.sort_unstable();
        let mut merged: Vec<(usize, usize)> = Vec::new();
        for (lo, hi) in intervals {
            match merged.last_mut() {
                Some(last) if lo <= last.1 => last.1 = last.1.max(hi),
                _ => merged.push((lo, hi)),
            }
        }

        // (first chain position, last chain position, fragment)
        let mut parts: Vec<(usize, usize, Fragment)> = Vec::new();
        let mut cursor = 0;
        for (lo, hi) in merged {
            if cursor < lo {
                parts.push((cursor, lo - 1, self.linear(&chain[cursor..lo])));
            }
            parts.push((lo, hi, self.ring_group(branch, lo, hi)));
            cursor = hi + 1;
        }
        if cursor < chain.len() {
            parts.push((cursor, chain.len() - 1, self.linear(&chain[cursor..])));
        }

        let atoms = &self.list.atoms;
        let mut components = Vec::with_capacity(parts.len());
        let mut joins = Vec::new();
        for (i, (first, _, fragment)) in parts.iter().enumerate() {
            let head = &atoms[chain[*first]];
            let component = fragment.with_leading_bond(head.bond);
            if head.bond_before_paren {
                components.push(component.with_bond_before_paren(true));
            } else {
                components.push(component);
            }
            let Some(prev) = head.prev_atom_index else {
                continue;
            };
            let at = self.chain_pos[prev];
            if let Some(previous) = parts.iter().position(|(lo, hi, _)| *lo <= at && at <= *hi) {
                joins.push(Join {
                    component: i,
                    previous,
                    atom: prev,
                });
            }
        }

        match components.len() {
            0 => Molecule::default().into(),
            1 => components.remove(0),
            _ => Molecule::with_joins(components, joins).into(),
        }
    }

    fn linear(&self, run: &[usize]) -> Fragment {
        let atoms = &self.list.atoms;
        let mut attachments: BTreeMap<usize, Vec<Fragment>> = BTreeMap::new();
        for (i, &a) in run.iter().enumerate() {
            for &branch in &atoms[a].branches {
                attachments
                    .entry(i + 1)
                    .or_default()
                    .push(self.build_chain(Some(branch)));
            }
        }
        Linear {
            atoms: run.iter().map(|&a| atoms[a].value.clone()).collect(),
            bonds: run.iter().skip(1).map(|&a| atoms[a].bond).collect(),
            attachments,
            leading_bond: None,
            bond_before_paren: false,
        }
        .into()
    }

    /// Materializes the rings laid out in chain `scope` between chain
    /// positions `lo` and `hi`, together with everything written inline
    /// with them.
    fn ring_group(&self, scope: Option<usize>, lo: usize, hi: usize) -> Fragment {
        let atoms = &self.list.atoms;
        let rings = &self.list.rings;
        let chain = self.chain(scope);

        let mut members: Vec<usize> = (0..rings.len())
            .filter(|&r| {
                self.scopes[r] == scope && {
                    let at = self.chain_pos[self.anchor(rings[r].start, scope)];
                    lo <= at && at <= hi
                }
            })
            .collect();
        let mut transparent: BTreeSet<usize> = BTreeSet::new();
        loop {
            let before = (members.len(), transparent.len());
            for &m in &members {
                transparent.extend(self.crossed_branches(m));
            }
            for r in 0..rings.len() {
                if !members.contains(&r)
                    && self.scopes[r].is_some_and(|s| transparent.contains(&s))
                {
                    members.push(r);
                }
            }
            if before == (members.len(), transparent.len()) {
                break;
            }
        }

        let mut inline: BTreeSet<usize> = chain[lo..=hi].iter().copied().collect();
        for &branch in &transparent {
            inline.extend(self.chain(Some(branch)));
        }

        let refs: Vec<&RingBoundary> = members.iter().map(|&m| &rings[m]).collect();
        let groups = group_rings(&refs);
        let fused_count = groups.first().map_or(0, |g| g.members.len());
        let mut order: Vec<(usize, usize)> = Vec::with_capacity(members.len());
        for (g, group) in groups.iter().enumerate() {
            for (k, &m) in group.members.iter().enumerate() {
                let offset = if g == 0 { group.offsets[k] } else { 0 };
                order.push((members[m], offset));
            }
        }
        let member_of: BTreeMap<usize, usize> = order
            .iter()
            .enumerate()
            .map(|(i, &(boundary, _))| (boundary, i))
            .collect();
        let member_paths: Vec<Vec<usize>> = order
            .iter()
            .map(|&(boundary, _)| rings[boundary].positions.clone())
            .collect();

        trace!(
            "ring group at atom {}: {} fused, {} sequential, {} inline atoms",
            chain[lo],
            fused_count,
            order.len() - fused_count,
            inline.len()
        );

        let mut ring_attachments: Vec<BTreeMap<usize, Vec<Fragment>>> =
            vec![BTreeMap::new(); order.len()];
        let mut ring_slots: BTreeMap<(usize, usize), usize> = BTreeMap::new();
        let mut seq_atom_attachments: BTreeMap<usize, Vec<Fragment>> = BTreeMap::new();
        let mut inline_atoms: BTreeMap<usize, InlineAtom> = BTreeMap::new();

        for &a in &inline {
            let atom = &atoms[a];
            let mut branches = Vec::with_capacity(atom.branches.len());
            for &branch in &atom.branches {
                if transparent.contains(&branch) {
                    if let Some(&first) = self.chain(Some(branch)).first() {
                        branches.push(BranchSlot::Inline(first));
                    }
                    continue;
                }
                let fragment = self.build_chain(Some(branch));
                let on_ring = member_paths
                    .iter()
                    .enumerate()
                    .find_map(|(m, path)| path.iter().position(|&p| p == a).map(|i| (m, i + 1)));
                let site = match on_ring {
                    Some((member, position)) => {
                        let frags = ring_attachments[member].entry(position).or_default();
                        frags.push(fragment);
                        *ring_slots.entry((member, position)).or_default() += 1;
                        AttachmentSite::Ring {
                            member,
                            position,
                            slot: frags.len() - 1,
                        }
                    }
                    None => {
                        let frags = seq_atom_attachments.entry(a).or_default();
                        frags.push(fragment);
                        AttachmentSite::Atom {
                            atom: a,
                            slot: frags.len() - 1,
                        }
                    }
                };
                branches.push(BranchSlot::Attachment(site));
            }

            let markers = atom
                .markers
                .iter()
                .filter_map(|marker| {
                    let &member = member_of.get(&marker.boundary)?;
                    Some(MarkerSlot {
                        member,
                        ring_number: marker.ring,
                        raw: marker.raw.clone(),
                        bond: marker.bond,
                        after_branches: marker.after_branches,
                    })
                })
                .collect();

            let next = self
                .chain(atom.branch_id)
                .get(self.chain_pos[a] + 1)
                .copied()
                .filter(|n| inline.contains(n));

            inline_atoms.insert(
                a,
                InlineAtom {
                    value: atom.value.clone(),
                    bond: atom.bond,
                    bond_before_paren: atom.bond_before_paren,
                    branch_depth: atom.branch_depth,
                    branch_id: atom.branch_id,
                    parent_index: atom.parent_index,
                    prev_atom_index: atom.prev_atom_index,
                    next,
                    markers,
                    branches,
                },
            );
        }

        let mut nodes: Vec<Ring> = order
            .iter()
            .zip(ring_attachments)
            .map(|(&(boundary, offset), attachments)| {
                self.ring_node(&rings[boundary], offset, attachments)
            })
            .collect();

        let metadata = ParserMetadata {
            root: chain[lo],
            all_positions: inline.into_iter().collect(),
            atoms: inline_atoms,
            member_paths,
            seq_atom_attachments,
            ring_slots,
        };

        if nodes.len() == 1 {
            let ring = nodes.remove(0);
            let parsed = codegen::write_parsed(&[&ring], &metadata);
            if codegen::write_plain_ring(&ring) == parsed {
                return ring.into();
            }
            return ring.with_metadata(metadata).into();
        }
        let sequential = nodes.split_off(fused_count);
        FusedRing::from_parsed(nodes, sequential, metadata).into()
    }

    fn ring_node(
        &self,
        boundary: &RingBoundary,
        offset: usize,
        attachments: BTreeMap<usize, Vec<Fragment>>,
    ) -> Ring {
        let atoms = &self.list.atoms;
        let path = &boundary.positions;
        let base = majority(path.iter().map(|&a| atoms[a].value.as_str()));
        let substitutions = path
            .iter()
            .enumerate()
            .filter(|(_, a)| atoms[**a].value != base)
            .map(|(i, a)| (i + 1, atoms[*a].value.clone()))
            .collect();
        let mut bonds: Vec<Option<Bond>> = path
            .windows(2)
            .map(|pair| self.bond_between(pair[0], pair[1]))
            .collect();
        bonds.push(boundary.close_bond.or(boundary.open_bond));

        Ring {
            atoms: base,
            size: path.len(),
            ring_number: boundary.ring_number,
            offset,
            substitutions,
            attachments,
            bonds,
            leading_bond: None,
            bond_before_paren: false,
            metadata: None,
        }
    }

    /// Bond glyph written on the edge between two adjacent cycle atoms.
    fn bond_between(&self, a: usize, b: usize) -> Option<Bond> {
        let atoms = &self.list.atoms;
        let follows = |x: usize, y: usize| match atoms[y].prev_atom_index {
            Some(prev) => prev == x,
            None => atoms[y].parent_index == Some(x),
        };
        if follows(a, b) {
            return atoms[b].bond;
        }
        if follows(b, a) {
            return atoms[a].bond;
        }
        self.list
            .rings
            .iter()
            .find(|r| (r.start, r.end) == (a, b) || (r.start, r.end) == (b, a))
            .and_then(|r| r.close_bond.or(r.open_bond))
    }
}

/// Most frequent value; ties go to the one seen first.
fn majority<'b>(values: impl Iterator<Item = &'b str>) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some(entry) => entry.1 += 1,
            None => counts.push((value, 1)),
        }
    }
    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(v, _)| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_atoms;

    fn build(s: &str) -> Fragment {
        build_fragment(&parse_atoms(s).unwrap())
    }

    #[test]
    fn majority_prefers_the_first_on_ties() {
        assert_eq!(majority(["n", "c", "c"].into_iter()), "c");
        assert_eq!(majority(["n", "c"].into_iter()), "n");
    }

    #[test]
    fn chain_with_branch() {
        let frag = build("CC(=O)O");
        let linear = frag.as_linear().unwrap();
        assert_eq!(linear.atoms(), ["C", "C", "O"]);
        let branch = &linear.attachments_at(2)[0];
        assert_eq!(branch.leading_bond(), Some(Bond::Double));
        assert_eq!(branch.smiles(), "O");
    }

    #[test]
    fn ring_branch_becomes_an_attachment() {
        let frag = build("C1CC(O)CC1");
        let ring = frag.as_ring().unwrap();
        assert_eq!(ring.size(), 5);
        assert!(!ring.has_metadata());
        assert_eq!(ring.attachments_at(3)[0].smiles(), "O");
    }

    #[test]
    fn closure_inside_a_branch_keeps_the_layout() {
        let frag = build("C1CC(C)(CC1)C");
        let mol = frag.as_molecule().unwrap();
        let ring = mol.components()[0].as_ring().unwrap();
        assert!(ring.has_metadata());
        assert_eq!(ring.size(), 5);
        assert_eq!(mol.joins(), [Join { component: 1, previous: 0, atom: 2 }]);
        assert_eq!(frag.smiles(), "C1CC(C)(CC1)C");
    }

    #[test]
    fn opening_bond_is_the_closure_bond() {
        let frag = build("C=1CCCCC1");
        let ring = frag.as_ring().unwrap();
        assert_eq!(ring.closure_bond(), Some(Bond::Double));
        assert!(ring.has_metadata());
    }

    #[test]
    fn spiro_rings_share_one_group() {
        let frag = build("C1CCC12CCC2");
        let fused = frag.as_fused_ring().unwrap();
        assert_eq!(fused.rings().len(), 2);
        assert_eq!(fused.rings()[1].offset(), 3);
        assert_eq!(frag.smiles(), "C1CCC12CCC2");
    }

    #[test]
    fn branch_sequence_is_carried_by_a_shell() {
        let s = "CCCCCC1=CC(=C(C(=C1)O)C2C=C(CCC2C(=C)C)C)O";
        let frag = build(s);
        let mol = frag.as_molecule().unwrap();
        assert_eq!(mol.len(), 3);
        let shell = mol.components()[1].as_fused_ring().unwrap();
        assert_eq!(shell.rings().len(), 1);
        assert_eq!(shell.sequential_rings().len(), 1);
        let meta = shell.metadata().unwrap();
        assert_eq!(meta.root(), 5);
        assert_eq!(meta.seq_atom_attachments()[&18][0].smiles(), "C");
        assert_eq!(frag.smiles(), s);
    }
}
