use petgraph::graph::{NodeIndex, UnGraph};

use crate::bond::Bond;
use crate::smiles::{ring_marker_text, AtomList};

/// Node weight of the molecular graph view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphAtom {
    /// Index in the parsed atom list.
    pub index: usize,
    pub value: String,
}

/// Builds the molecular graph of a parse: one node per atom, one edge per
/// chain or branch bond, and one edge per ring closure. Node indices equal
/// atom indices.
pub fn to_graph(list: &AtomList) -> UnGraph<GraphAtom, Option<Bond>> {
    let mut graph = UnGraph::with_capacity(list.atoms.len(), list.atoms.len() + list.rings.len());
    for atom in &list.atoms {
        graph.add_node(GraphAtom {
            index: atom.index,
            value: atom.value.clone(),
        });
    }
    for atom in &list.atoms {
        if let Some(from) = atom.prev_atom_index.or(atom.parent_index) {
            graph.add_edge(NodeIndex::new(from), NodeIndex::new(atom.index), atom.bond);
        }
    }
    for ring in &list.rings {
        graph.add_edge(
            NodeIndex::new(ring.start),
            NodeIndex::new(ring.end),
            ring.close_bond.or(ring.open_bond),
        );
    }
    graph
}

struct RingClosure {
    ring_id: u16,
    bond: Option<Bond>,
}

/// Writes the component containing `root` as SMILES starting from `root`.
/// Neighbors are visited in node order; every non-tree edge becomes a ring
/// closure numbered from 1.
pub fn write_rooted(graph: &UnGraph<GraphAtom, Option<Bond>>, root: NodeIndex) -> String {
    let n = graph.node_count();
    if root.index() >= n {
        return String::new();
    }

    let mut visited = vec![false; n];
    let mut parent = vec![None::<NodeIndex>; n];
    let mut children: Vec<Vec<NodeIndex>> = (0..n).map(|_| Vec::new()).collect();
    let mut ring_opens: Vec<Vec<RingClosure>> = (0..n).map(|_| Vec::new()).collect();
    let mut ring_closes: Vec<Vec<RingClosure>> = (0..n).map(|_| Vec::new()).collect();
    let mut closed_pairs: Vec<(NodeIndex, NodeIndex)> = Vec::new();
    let mut next_ring_id: u16 = 1;

    let neighbor_lists: Vec<Vec<NodeIndex>> = (0..n)
        .map(|i| {
            let mut neighbors: Vec<NodeIndex> = graph.neighbors(NodeIndex::new(i)).collect();
            neighbors.sort();
            neighbors.dedup();
            neighbors
        })
        .collect();

    let mut stack: Vec<(NodeIndex, usize)> = Vec::new();
    visited[root.index()] = true;
    stack.push((root, 0));

    loop {
        let Some(&mut (node, ref mut ni)) = stack.last_mut() else {
            break;
        };
        let neighbors = &neighbor_lists[node.index()];
        if *ni >= neighbors.len() {
            stack.pop();
            continue;
        }
        let neighbor = neighbors[*ni];
        *ni += 1;

        if !visited[neighbor.index()] {
            visited[neighbor.index()] = true;
            parent[neighbor.index()] = Some(node);
            children[node.index()].push(neighbor);
            stack.push((neighbor, 0));
        } else if parent[node.index()] != Some(neighbor) && neighbor != node {
            let pair = (node.min(neighbor), node.max(neighbor));
            if !closed_pairs.contains(&pair) {
                closed_pairs.push(pair);
                let bond = graph
                    .find_edge(node, neighbor)
                    .and_then(|edge| graph[edge]);
                let ring_id = next_ring_id;
                next_ring_id += 1;
                ring_opens[neighbor.index()].push(RingClosure { ring_id, bond: None });
                ring_closes[node.index()].push(RingClosure { ring_id, bond });
            }
        }
    }

    let ctx = DfsContext {
        children,
        ring_opens,
        ring_closes,
    };
    let mut out = String::new();
    write_node(graph, root, &ctx, &mut out);
    out
}

struct DfsContext {
    children: Vec<Vec<NodeIndex>>,
    ring_opens: Vec<Vec<RingClosure>>,
    ring_closes: Vec<Vec<RingClosure>>,
}

fn write_node(
    graph: &UnGraph<GraphAtom, Option<Bond>>,
    node: NodeIndex,
    ctx: &DfsContext,
    out: &mut String,
) {
    out.push_str(&graph[node].value);

    for rc in ctx.ring_opens[node.index()]
        .iter()
        .chain(&ctx.ring_closes[node.index()])
    {
        if let Some(bond) = rc.bond {
            out.push(bond.as_char());
        }
        out.push_str(&ring_marker_text(rc.ring_id));
    }

    let kids = &ctx.children[node.index()];
    if kids.is_empty() {
        return;
    }

    let last = kids.len() - 1;
    for (i, &child) in kids.iter().enumerate() {
        let is_branch = i < last;
        if is_branch {
            out.push('(');
        }
        if let Some(bond) = graph.find_edge(node, child).and_then(|edge| graph[edge]) {
            out.push(bond.as_char());
        }
        write_node(graph, child, ctx, out);
        if is_branch {
            out.push(')');
        }
    }
}
