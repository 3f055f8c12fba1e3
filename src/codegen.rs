use std::collections::BTreeMap;

use crate::bond::Bond;
use crate::fragment::metadata::{AttachmentSite, BranchSlot, ParserMetadata};
use crate::fragment::{Fragment, FusedRing, Linear, Molecule, Ring};
use crate::smiles::ring_marker_text;

pub fn write(fragment: &Fragment) -> String {
    match fragment {
        Fragment::Linear(l) => write_linear(l),
        Fragment::Ring(r) => write_ring(r),
        Fragment::FusedRing(f) => write_fused(f),
        Fragment::Molecule(m) => write_molecule(m),
        Fragment::Raw(r) => r.smiles.clone(),
    }
}

pub fn write_linear(linear: &Linear) -> String {
    let mut out = String::new();
    for (i, atom) in linear.atoms.iter().enumerate() {
        if i > 0 {
            push_bond(&mut out, linear.bonds.get(i - 1).copied().flatten());
        }
        out.push_str(atom);
        write_attachments(&mut out, linear.attachments_at(i + 1));
    }
    for frags in linear.attachments.range(linear.atoms.len() + 1..).map(|(_, f)| f) {
        write_attachments(&mut out, frags);
    }
    out
}

pub fn write_ring(ring: &Ring) -> String {
    match &ring.metadata {
        Some(meta) => write_parsed(&[ring], meta),
        None => write_plain_ring(ring),
    }
}

/// The ring written from its own fields, ignoring any parse layout.
pub(crate) fn write_plain_ring(ring: &Ring) -> String {
    let mut out = String::new();
    let marker = ring_marker_text(ring.ring_number);
    for pos in 1..=ring.size {
        if pos > 1 {
            push_bond(&mut out, ring.bonds.get(pos - 2).copied().flatten());
        }
        out.push_str(ring.atom_at(pos).unwrap_or(&ring.atoms));
        if pos == 1 {
            out.push_str(&marker);
        }
        if pos == ring.size {
            push_bond(&mut out, ring.closure_bond());
            out.push_str(&marker);
        }
        write_attachments(&mut out, ring.attachments_at(pos));
    }
    out
}

pub fn write_fused(fused: &FusedRing) -> String {
    match &fused.metadata {
        Some(meta) => write_parsed(&fused.members(), meta),
        None => write_built_fused(fused),
    }
}

pub fn write_molecule(molecule: &Molecule) -> String {
    let mut out = String::new();
    for (i, component) in molecule.components.iter().enumerate() {
        if i > 0 && !out.is_empty() {
            push_bond(&mut out, component.leading_bond());
        }
        out.push_str(&write(component));
    }
    out
}

fn push_bond(out: &mut String, bond: Option<Bond>) {
    if let Some(b) = bond {
        out.push(b.as_char());
    }
}

fn write_attachment(out: &mut String, frag: &Fragment) {
    if frag.bond_before_paren() {
        push_bond(out, frag.leading_bond());
        out.push('(');
    } else {
        out.push('(');
        push_bond(out, frag.leading_bond());
    }
    out.push_str(&write(frag));
    out.push(')');
}

fn write_attachments(out: &mut String, frags: &[Fragment]) {
    for frag in frags {
        write_attachment(out, frag);
    }
}

/// Builder layout: walk the base ring; a member with offset `k` opens at
/// base position `k + 1`, writes its own interior atoms, and closes at base
/// position `k + 2`.
fn write_built_fused(fused: &FusedRing) -> String {
    let Some((base, members)) = fused.rings.split_first() else {
        return String::new();
    };
    let mut opens: BTreeMap<usize, Vec<&Ring>> = BTreeMap::new();
    let mut closes: BTreeMap<usize, Vec<&Ring>> = BTreeMap::new();
    for member in members {
        opens.entry(member.offset + 1).or_default().push(member);
        closes.entry(member.offset + 2).or_default().push(member);
    }

    let mut out = String::new();
    for pos in 1..=base.size {
        let opening = opens.get(&pos).map(Vec::as_slice).unwrap_or(&[]);
        let closing = closes.get(&pos).map(Vec::as_slice).unwrap_or(&[]);

        if pos > 1 {
            let bond = match closing.first() {
                Some(member) => member.bonds.get(member.size - 2).copied().flatten(),
                None => base.bonds.get(pos - 2).copied().flatten(),
            };
            push_bond(&mut out, bond);
        }

        let mut value = base.atom_at(pos).unwrap_or(&base.atoms);
        for member in opening {
            if let Some(element) = member.substitutions.get(&1) {
                value = element.as_str();
            }
        }
        for member in closing {
            if let Some(element) = member.substitutions.get(&member.size) {
                value = element.as_str();
            }
        }
        out.push_str(value);

        if pos == 1 {
            out.push_str(&ring_marker_text(base.ring_number));
        }
        for member in closing {
            let shared = base.bonds.get(pos - 2).copied().flatten();
            push_bond(&mut out, member.closure_bond().or(shared));
            out.push_str(&ring_marker_text(member.ring_number));
        }
        if pos == base.size {
            push_bond(&mut out, base.closure_bond());
            out.push_str(&ring_marker_text(base.ring_number));
        }
        for member in opening {
            out.push_str(&ring_marker_text(member.ring_number));
        }

        write_attachments(&mut out, base.attachments_at(pos));
        for member in closing {
            write_attachments(&mut out, member.attachments_at(member.size));
        }
        for member in opening {
            write_attachments(&mut out, member.attachments_at(1));
            for inner in 2..member.size {
                push_bond(&mut out, member.bonds.get(inner - 2).copied().flatten());
                out.push_str(member.atom_at(inner).unwrap_or(&member.atoms));
                write_attachments(&mut out, member.attachments_at(inner));
            }
        }
    }

    for ring in &fused.sequential {
        push_bond(&mut out, ring.leading_bond);
        out.push_str(&write_plain_ring(ring));
    }
    out
}

/// Replays a parse layout. Member rings supply the current ring numbers,
/// element substitutions and attachments; the metadata supplies the order
/// in which atoms, markers and branches were written.
pub(crate) fn write_parsed(members: &[&Ring], meta: &ParserMetadata) -> String {
    let mut out = String::new();
    let writer = ParsedWriter { members, meta };
    writer.write_chain(&mut out, meta.root, true);
    out
}

struct ParsedWriter<'a> {
    members: &'a [&'a Ring],
    meta: &'a ParserMetadata,
}

impl ParsedWriter<'_> {
    fn write_chain(&self, out: &mut String, first: usize, is_root: bool) {
        let mut current = Some(first);
        let mut root = is_root;
        while let Some(index) = current {
            current = self.write_atom(out, index, root);
            root = false;
        }
    }

    /// Writes one inline atom and returns the next atom of its chain.
    fn write_atom(&self, out: &mut String, index: usize, is_root: bool) -> Option<usize> {
        let atom = self.meta.atoms.get(&index)?;
        if !is_root {
            push_bond(out, atom.bond);
        }
        out.push_str(self.value_of(index, &atom.value));

        for k in 0..=atom.branches.len() {
            for marker in atom.markers.iter().filter(|m| m.after_branches == k) {
                push_bond(out, marker.bond);
                match self.members.get(marker.member) {
                    Some(ring) if ring.ring_number != marker.ring_number => {
                        out.push_str(&ring_marker_text(ring.ring_number));
                    }
                    _ => out.push_str(&marker.raw),
                }
            }
            match atom.branches.get(k) {
                Some(BranchSlot::Inline(first)) => {
                    let head = self.meta.atoms.get(first);
                    let before = head.is_some_and(|a| a.bond_before_paren);
                    if before {
                        push_bond(out, head.and_then(|a| a.bond));
                    }
                    out.push('(');
                    self.write_chain(out, *first, before);
                    out.push(')');
                }
                Some(BranchSlot::Attachment(site)) => {
                    if let Some(frag) = self.attachment(site) {
                        write_attachment(out, frag);
                    }
                }
                None => {}
            }
        }

        for (m, ring) in self.members.iter().enumerate() {
            let Some(path) = self.meta.member_paths.get(m) else {
                continue;
            };
            if let Some(p) = path.iter().position(|&a| a == index) {
                let recorded = self.meta.recorded_attachments(m, p + 1);
                for frag in ring.attachments_at(p + 1).iter().skip(recorded) {
                    write_attachment(out, frag);
                }
            }
        }

        atom.next
    }

    /// The element to write: a member's substitution wins over the parsed
    /// value once it differs.
    fn value_of<'b>(&'b self, index: usize, parsed: &'b str) -> &'b str {
        for (m, ring) in self.members.iter().enumerate() {
            let Some(path) = self.meta.member_paths.get(m) else {
                continue;
            };
            if let Some(p) = path.iter().position(|&a| a == index) {
                if let Some(value) = ring.atom_at(p + 1) {
                    if value != parsed {
                        return value;
                    }
                }
            }
        }
        parsed
    }

    fn attachment(&self, site: &AttachmentSite) -> Option<&Fragment> {
        match *site {
            AttachmentSite::Ring {
                member,
                position,
                slot,
            } => self
                .members
                .get(member)
                .and_then(|ring| ring.attachments_at(position).get(slot)),
            AttachmentSite::Atom { atom, slot } => self
                .meta
                .seq_atom_attachments
                .get(&atom)
                .and_then(|frags| frags.get(slot)),
        }
    }
}
