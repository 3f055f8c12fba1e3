use std::collections::{BTreeMap, HashSet};

use petgraph::unionfind::UnionFind;

use crate::smiles::{Atom, RingBoundary};

/// Ordered atom indices on the cycle closed between `start` and `end`.
///
/// The cycle follows the chain tree, where every atom hangs off its previous
/// sibling or else off its branch parent, from `start` up to the common
/// ancestor and down to `end`. A ring already closed between two interior
/// atoms of that path is a shortcut: the walk keeps both of its ends and
/// skips what lies between, since those two atoms are the fusion pair.
pub fn ring_path(
    atoms: &[Atom],
    closed: &[RingBoundary],
    start: usize,
    end: usize,
) -> Vec<usize> {
    let lineage = |from: usize| {
        let mut line = vec![from];
        let mut a = from;
        while let Some(up) = atoms[a].prev_atom_index.or(atoms[a].parent_index) {
            line.push(up);
            a = up;
        }
        line
    };
    let from_start = lineage(start);
    let from_end = lineage(end);
    let above_end: HashSet<usize> = from_end.iter().copied().collect();
    let Some(meet) = from_start.iter().copied().find(|a| above_end.contains(a)) else {
        return vec![start, end];
    };

    let mut tree_path: Vec<usize> = from_start.iter().copied().take_while(|&a| a != meet).collect();
    tree_path.push(meet);
    let descent: Vec<usize> = from_end.iter().copied().take_while(|&a| a != meet).collect();
    tree_path.extend(descent.into_iter().rev());

    let last = tree_path.len() - 1;
    let at = |atom: usize| tree_path.iter().position(|&a| a == atom);
    let mut shortcuts: BTreeMap<usize, usize> = BTreeMap::new();
    for r in closed {
        let (Some(i), Some(j)) = (at(r.start), at(r.end)) else {
            continue;
        };
        let (i, j) = (i.min(j), i.max(j));
        if 0 < i && i + 1 < j && j < last {
            let jump = shortcuts.entry(i).or_insert(j);
            *jump = (*jump).max(j);
        }
    }

    let mut path = Vec::with_capacity(tree_path.len());
    let mut i = 0;
    while i <= last {
        path.push(tree_path[i]);
        i = match shortcuts.get(&i) {
            Some(&jump) => jump,
            None => i + 1,
        };
    }
    path
}

/// A set of rings connected through shared atoms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingGroup {
    /// Indices into the grouped slice, ordered by opening atom.
    pub members: Vec<usize>,
    /// Per member, the index into the base ring's path where it first
    /// meets the base; zero for the base itself and for rings that never
    /// touch it.
    pub offsets: Vec<usize>,
}

impl RingGroup {
    pub fn base(&self) -> usize {
        self.members[0]
    }
}

/// Partitions rings by the transitive closure of "shares an atom".
/// Groups are ordered by the opening atom of their base ring.
pub fn group_rings(rings: &[&RingBoundary]) -> Vec<RingGroup> {
    let mut sets = UnionFind::<usize>::new(rings.len());
    let mut owner: BTreeMap<usize, usize> = BTreeMap::new();
    for (i, ring) in rings.iter().enumerate() {
        for &atom in &ring.positions {
            match owner.get(&atom) {
                Some(&j) => {
                    sets.union(i, j);
                }
                None => {
                    owner.insert(atom, i);
                }
            }
        }
    }

    let mut by_root: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..rings.len() {
        by_root.entry(sets.find(i)).or_default().push(i);
    }

    let mut groups: Vec<RingGroup> = by_root
        .into_values()
        .map(|mut members| {
            members.sort_by_key(|&m| (rings[m].start, rings[m].end));
            let base = &rings[members[0]].positions;
            let offsets = members
                .iter()
                .map(|&m| {
                    if m == members[0] {
                        return 0;
                    }
                    rings[m]
                        .positions
                        .iter()
                        .find_map(|a| base.iter().position(|b| b == a))
                        .unwrap_or(0)
                })
                .collect();
            RingGroup { members, offsets }
        })
        .collect();
    groups.sort_by_key(|g| rings[g.base()].start);
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_atoms;

    fn paths(s: &str) -> Vec<Vec<usize>> {
        parse_atoms(s)
            .unwrap()
            .rings
            .into_iter()
            .map(|r| r.positions)
            .collect()
    }

    #[test]
    fn simple_ring_is_contiguous() {
        assert_eq!(paths("C1CCCCC1"), vec![vec![0, 1, 2, 3, 4, 5]]);
    }

    #[test]
    fn interleaved_ring_is_shortcut() {
        let p = paths("C1CC2CCCCC2CC1");
        assert_eq!(p[0], vec![2, 3, 4, 5, 6, 7]);
        assert_eq!(p[1], vec![0, 1, 2, 7, 8, 9]);
    }

    #[test]
    fn branch_not_on_the_cycle_is_skipped() {
        assert_eq!(paths("C1CC(O)CC1"), vec![vec![0, 1, 2, 4, 5]]);
    }

    #[test]
    fn closure_inside_branch_follows_the_branch() {
        assert_eq!(paths("C1CC(C)(CC1)C"), vec![vec![0, 1, 2, 4, 5]]);
        assert_eq!(paths("C1CC(C(O)C1)"), vec![vec![0, 1, 2, 3, 5]]);
    }

    #[test]
    fn closure_in_a_later_sibling_branch() {
        assert_eq!(paths("C1C(CC)CC(C1)"), vec![vec![0, 1, 4, 5, 6]]);
    }

    #[test]
    fn closure_behind_the_opener_goes_through_the_parent() {
        assert_eq!(paths("C(C2CC1)1C2"), vec![vec![0, 1, 2, 3], vec![1, 0, 4]]);
        assert_eq!(paths("CC(CC1)1"), vec![vec![1, 2, 3]]);
    }

    #[test]
    fn opener_deeper_than_the_closure() {
        assert_eq!(paths("C(C1)CC1"), vec![vec![1, 0, 2, 3]]);
    }

    #[test]
    fn every_path_holds_both_ends() {
        for s in ["C=N1c(O=1(=c1O2C)23ONOc13)", "C1CC2CCCCC2C3CCCC31", "c1ccc2c(c1)cccc2"] {
            for ring in parse_atoms(s).unwrap().rings {
                assert!(ring.start < ring.end, "{s}");
                assert!(ring.positions.len() >= 3, "{s}");
                assert_eq!(ring.positions.first(), Some(&ring.start), "{s}");
                assert_eq!(ring.positions.last(), Some(&ring.end), "{s}");
            }
        }
    }

    #[test]
    fn cannabidiol_rings() {
        let p = paths("CCCCCC1=CC(=C(C(=C1)O)C2C=C(CCC2C(=C)C)C)O");
        assert_eq!(p[0], vec![5, 6, 7, 8, 9, 10]);
        assert_eq!(p[1], vec![12, 13, 14, 15, 16, 17]);
    }

    #[test]
    fn grouping_by_shared_atoms() {
        let list = parse_atoms("C1CC2CCCCC2CC1C3CC3").unwrap();
        let refs: Vec<&RingBoundary> = list.rings.iter().collect();
        let groups = group_rings(&refs);
        assert_eq!(groups.len(), 2);
        // ring 2 closes first, so it is boundary 0; ring 1 opens first.
        assert_eq!(groups[0].members, vec![1, 0]);
        assert_eq!(groups[0].offsets, vec![0, 2]);
        assert_eq!(groups[1].members, vec![2]);
    }

    #[test]
    fn spiro_rings_share_one_atom() {
        let list = parse_atoms("C1CCC12CCC2").unwrap();
        let refs: Vec<&RingBoundary> = list.rings.iter().collect();
        let groups = group_rings(&refs);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].offsets, vec![0, 3]);
    }
}
