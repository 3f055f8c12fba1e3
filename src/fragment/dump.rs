use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::bond::Bond;
use crate::fragment::{Fragment, FusedRing, Linear, Ring};

impl Fragment {
    /// Structural dump of the tree as JSON.
    pub fn to_object(&self) -> Value {
        let mut object = match self {
            Fragment::Linear(l) => json!({
                "type": "Linear",
                "atoms": l.atoms,
                "bonds": l.bonds,
                "attachments": attachments_object(&l.attachments),
                "leadingBond": l.leading_bond,
            }),
            Fragment::Ring(r) => ring_object(r),
            Fragment::FusedRing(f) => {
                let mut object = json!({
                    "type": "FusedRing",
                    "rings": f.rings.iter().map(ring_object).collect::<Vec<_>>(),
                    "sequentialRings": f.sequential.iter().map(ring_object).collect::<Vec<_>>(),
                    "totalAtoms": f.total_atoms(),
                    "leadingBond": f.leading_bond,
                });
                if let (Some(meta), Value::Object(fields)) = (&f.metadata, &mut object) {
                    fields.insert("allPositions".to_string(), json!(meta.all_positions));
                }
                object
            }
            Fragment::Molecule(m) => json!({
                "type": "Molecule",
                "components": m.components.iter().map(Fragment::to_object).collect::<Vec<_>>(),
            }),
            Fragment::Raw(r) => json!({
                "type": "RawFragment",
                "smiles": r.smiles,
                "leadingBond": r.leading_bond,
            }),
        };
        // a molecule reports the flag of its first component
        if self.bond_before_paren() && !matches!(self, Fragment::Molecule(_)) {
            if let Value::Object(fields) = &mut object {
                fields.insert("bondBeforeParen".to_string(), Value::Bool(true));
            }
        }
        object
    }

    /// Rust source that rebuilds this fragment with the builder API, binding
    /// it to `var_name`. Parsed ring groups are rebuilt with `parse`.
    pub fn to_code(&self, var_name: &str) -> String {
        let mut writer = CodeWriter::default();
        writer.emit(self, var_name);
        writer.lines.join("\n")
    }
}

fn ring_object(ring: &Ring) -> Value {
    let substitutions: Map<String, Value> = ring
        .substitutions
        .iter()
        .map(|(k, v)| (k.to_string(), json!(v)))
        .collect();
    json!({
        "type": "Ring",
        "atoms": ring.atoms,
        "size": ring.size,
        "ringNumber": ring.ring_number,
        "offset": ring.offset,
        "substitutions": substitutions,
        "attachments": attachments_object(&ring.attachments),
        "bonds": ring.bonds,
        "leadingBond": ring.leading_bond,
        "hasMetadata": ring.metadata.is_some(),
    })
}

fn attachments_object(attachments: &BTreeMap<usize, Vec<Fragment>>) -> Value {
    Value::Object(
        attachments
            .iter()
            .map(|(pos, frags)| {
                (
                    pos.to_string(),
                    Value::Array(frags.iter().map(Fragment::to_object).collect()),
                )
            })
            .collect(),
    )
}

fn bond_code(bond: Option<Bond>) -> String {
    match bond {
        Some(b) => format!("Some({})", b.code_name()),
        None => "None".to_string(),
    }
}

fn bonds_code(bonds: &[Option<Bond>]) -> String {
    let items: Vec<String> = bonds.iter().map(|b| bond_code(*b)).collect();
    format!("vec![{}]", items.join(", "))
}

#[derive(Default)]
struct CodeWriter {
    lines: Vec<String>,
    counter: usize,
}

impl CodeWriter {
    fn fresh(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{}_{}", prefix, self.counter)
    }

    fn emit(&mut self, frag: &Fragment, name: &str) {
        match frag {
            Fragment::Linear(l) => self.emit_linear(l, name),
            Fragment::Ring(r) if r.metadata.is_some() => self.emit_parsed(frag, name),
            Fragment::Ring(r) => self.emit_ring(r, name),
            Fragment::FusedRing(f) if f.metadata.is_some() => self.emit_parsed(frag, name),
            Fragment::FusedRing(f) => self.emit_fused(f, name),
            Fragment::Molecule(m) => {
                let parts: Vec<String> = m
                    .components
                    .iter()
                    .map(|c| {
                        let part = self.fresh(name);
                        self.emit(c, &part);
                        format!("{}.into()", part)
                    })
                    .collect();
                self.lines.push(format!(
                    "let {} = Molecule::new(vec![{}]);",
                    name,
                    parts.join(", ")
                ));
            }
            Fragment::Raw(r) => {
                self.lines.push(format!(
                    "let {} = RawFragment::new({:?}){};",
                    name,
                    r.smiles,
                    leading_code(r.leading_bond, r.bond_before_paren)
                ));
            }
        }
    }

    fn emit_parsed(&mut self, frag: &Fragment, name: &str) {
        self.lines.push(format!(
            "let {} = parse({:?})?{};",
            name,
            frag.smiles(),
            leading_code(frag.leading_bond(), frag.bond_before_paren())
        ));
    }

    fn emit_attachments(
        &mut self,
        attachments: &BTreeMap<usize, Vec<Fragment>>,
        name: &str,
    ) -> String {
        let entries: Vec<String> = attachments
            .iter()
            .map(|(pos, frags)| {
                let subs: Vec<String> = frags
                    .iter()
                    .map(|f| {
                        let sub = self.fresh(name);
                        self.emit(f, &sub);
                        format!("{}.into()", sub)
                    })
                    .collect();
                format!("({}, vec![{}])", pos, subs.join(", "))
            })
            .collect();
        if entries.is_empty() {
            "BTreeMap::new()".to_string()
        } else {
            format!("BTreeMap::from([{}])", entries.join(", "))
        }
    }

    fn emit_linear(&mut self, linear: &Linear, name: &str) {
        let attachments = self.emit_attachments(&linear.attachments, name);
        let atoms: Vec<String> = linear
            .atoms
            .iter()
            .map(|a| format!("{:?}.to_string()", a))
            .collect();
        self.lines.push(format!(
            "let {} = Linear::from_parts(vec![{}], {}, {})?{};",
            name,
            atoms.join(", "),
            bonds_code(&linear.bonds),
            attachments,
            leading_code(linear.leading_bond, linear.bond_before_paren)
        ));
    }

    fn ring_spec(&mut self, ring: &Ring, name: &str) -> String {
        let mut spec = format!("RingSpec::new({:?}, {})", ring.atoms, ring.size);
        if ring.ring_number != 1 {
            spec.push_str(&format!(".ring_number({})", ring.ring_number));
        }
        if ring.offset != 0 {
            spec.push_str(&format!(".offset({})", ring.offset));
        }
        for (pos, element) in &ring.substitutions {
            spec.push_str(&format!(".substitution({}, {:?})", pos, element));
        }
        for (pos, frags) in &ring.attachments {
            for frag in frags {
                let sub = self.fresh(name);
                self.emit(frag, &sub);
                spec.push_str(&format!(".attachment({}, {})", pos, sub));
            }
        }
        if ring.bonds.iter().any(Option::is_some) {
            spec.push_str(&format!(".bonds({})", bonds_code(&ring.bonds)));
        }
        spec
    }

    fn emit_ring(&mut self, ring: &Ring, name: &str) {
        let spec = self.ring_spec(ring, name);
        self.lines.push(format!(
            "let {} = Ring::new({})?{};",
            name,
            spec,
            leading_code(ring.leading_bond, ring.bond_before_paren)
        ));
    }

    fn emit_fused(&mut self, fused: &FusedRing, name: &str) {
        let members: Vec<String> = fused
            .rings
            .iter()
            .map(|ring| {
                let member = self.fresh(name);
                self.emit_ring(ring, &member);
                member
            })
            .collect();
        self.lines.push(format!(
            "let {} = FusedRing::from_rings(vec![{}])?{};",
            name,
            members.join(", "),
            leading_code(fused.leading_bond, fused.bond_before_paren)
        ));
    }
}

fn leading_code(bond: Option<Bond>, before_paren: bool) -> String {
    let mut code = match bond {
        Some(_) => format!(".with_leading_bond({})", bond_code(bond)),
        None => String::new(),
    };
    if before_paren {
        code.push_str(".with_bond_before_paren(true)");
    }
    code
}
