use std::collections::BTreeSet;

use crate::*;

fn benzene() -> Ring {
    Ring::new(RingSpec::new("c", 6)).unwrap()
}

fn cyclohexane() -> Ring {
    Ring::new(RingSpec::new("C", 6)).unwrap()
}

fn built() -> Vec<Fragment> {
    let methyl = Linear::new(&["C"]).unwrap();
    vec![
        benzene().attach(methyl.clone(), 4).unwrap().into(),
        benzene().substitute(1, "n").unwrap().into(),
        benzene().attach(benzene(), 1).unwrap().into(),
        cyclohexane().fuse(&cyclohexane(), 2).unwrap().into(),
        benzene().fuse(&benzene(), 3).unwrap().into(),
        cyclohexane()
            .fuse(&cyclohexane(), 2)
            .unwrap()
            .add_ring(&Ring::new(RingSpec::new("C", 5)).unwrap(), 4)
            .unwrap()
            .into(),
        Linear::new(&["C", "C", "O"])
            .unwrap()
            .attach(Linear::new(&["O"]).unwrap().with_leading_bond(Some(Bond::Double)), 2)
            .unwrap()
            .into(),
        methyl.concat(&benzene().into()),
        FusedRings::new(&[6, 6], "c", FusedRingsOptions::default())
            .unwrap()
            .to_fragment(),
    ]
}

/// Every ring reachable from `frag`, paired with the metadata that lays it
/// out when there is one.
fn walk(frag: &Fragment, visit: &mut impl FnMut(&Ring, Option<&ParserMetadata>)) {
    let mut children: Vec<Fragment> = Vec::new();
    match frag {
        Fragment::Linear(l) => children.extend(l.attachments().values().flatten().cloned()),
        Fragment::Ring(r) => {
            visit(&**r, r.metadata());
            children.extend(r.attachments().values().flatten().cloned());
            if let Some(meta) = r.metadata() {
                children.extend(meta.seq_atom_attachments().values().flatten().cloned());
            }
        }
        Fragment::FusedRing(f) => {
            for ring in f.rings().iter().chain(f.sequential_rings()) {
                visit(ring, f.metadata());
                children.extend(ring.attachments().values().flatten().cloned());
            }
            if let Some(meta) = f.metadata() {
                children.extend(meta.seq_atom_attachments().values().flatten().cloned());
            }
        }
        Fragment::Molecule(m) => children.extend(m.components().iter().cloned()),
        Fragment::Raw(_) => {}
    }
    for child in &children {
        walk(child, visit);
    }
}

#[test]
fn builder_output_reparses_to_itself() {
    for frag in built() {
        let s = frag.smiles();
        let reparsed = parse(&s).unwrap_or_else(|e| panic!("{s}: {e}"));
        assert_eq!(reparsed.smiles(), s);
    }
}

#[test]
fn builder_output_is_a_single_well_formed_graph() {
    for frag in built() {
        let s = frag.smiles();
        assert_eq!(GraphValidator.check(&s), Verdict::Valid, "{s}");
    }
}

#[test]
fn external_validator_accepts_builder_output() {
    for frag in built() {
        let s = frag.smiles();
        let verdict = validate::check_with_env(&s);
        assert!(verdict.passes(), "{s}: {verdict:?}");
    }
}

#[test]
fn combinators_leave_the_receiver_untouched() {
    let parsed = parse("C1CC2CCCCC2CC1").unwrap();
    let fused = parsed.as_fused_ring().unwrap();
    let before = parsed.smiles();
    let _ = fused.substitute_in_ring(1, 2, "N").unwrap();
    let _ = fused.attach_to_ring(2, Linear::new(&["O"]).unwrap(), 3).unwrap();
    let _ = fused.renumber(Some(4)).unwrap();
    assert_eq!(parsed.smiles(), before);

    let chain = parse("CCO").unwrap();
    let _ = chain.attach(benzene(), 1).unwrap();
    assert_eq!(chain.smiles(), "CCO");
}

#[test]
fn colliding_markers_are_renumbered() {
    let host = parse("C1CCCCC1").unwrap();
    let guest = parse("C1CC1").unwrap();
    let joined = host.attach(guest, 3).unwrap();
    assert_eq!(joined.smiles(), "C1CC(C2CC2)CCC1");
    assert_eq!(joined.ring_numbers(), BTreeSet::from([1, 2]));
}

#[test]
fn removing_a_closing_marker_leaves_the_ring_open() {
    for s in ["c1ccccc1", "C1CC2CCCCC2CC1", "C1CC(C)(CC1)C", "Cc1ccc(O)cc1"] {
        for digit in s.chars().filter(char::is_ascii_digit) {
            let Some(at) = s.rfind(digit) else {
                continue;
            };
            let broken = format!("{}{}", &s[..at], &s[at + 1..]);
            let ring = digit as u16 - '0' as u16;
            assert_eq!(
                parse(&broken),
                Err(Error::Syntax(SyntaxError::UnclosedRing { rings: vec![ring] })),
                "{broken}"
            );
        }
    }
}

#[test]
fn parsed_rings_stay_within_their_size() {
    for s in [
        "C1CC(O)CC1",
        "c1ccc2ccccc2c1",
        "C1CC2CCCCC2C3CCCC31",
        "CCCCCC1=CC(=C(C(=C1)O)C2C=C(CCC2C(=C)C)C)O",
        "c1(c2ccccc2)ccccc1",
    ] {
        let frag = parse(s).unwrap();
        let mut rings = 0;
        walk(&frag, &mut |ring: &Ring, meta: Option<&ParserMetadata>| {
            rings += 1;
            let keys = ring.substitutions().keys().chain(ring.attachments().keys());
            for &position in keys {
                assert!((1..=ring.size()).contains(&position), "{s}");
            }
            if let Some(meta) = meta {
                for path in meta.member_paths() {
                    for atom in path {
                        assert!(meta.all_positions().contains(atom), "{s}");
                    }
                }
            }
        });
        assert!(rings > 0, "{s}");
    }
}

#[test]
fn codegen_is_pure() {
    for s in ["C1CC(C)(CC1)C", "C%12CC%12", "c1ccc2ccccc2c1"] {
        let frag = parse(s).unwrap();
        assert_eq!(frag.smiles(), frag.smiles());
        assert_eq!(frag.deep_clone(), frag);
        assert_eq!(frag.to_string(), s);
    }
}

#[test]
fn tokens_concatenate_back_to_the_input() {
    for s in ["C=1CC%12CC1C%12", "[13CH3]C(=O)/C=C\\Cl", "c1ccccc1.O"] {
        let text: String = tokenize(s).unwrap().iter().map(Token::text).collect();
        assert_eq!(text, s);
    }
    assert!(tokenize("C^C").is_err());
}
