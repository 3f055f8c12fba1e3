mod atoms;
mod builder;
pub mod error;
mod tokenizer;

use log::debug;

use crate::error::Error;
use crate::fragment::{Fragment, Molecule};
pub use atoms::{Atom, AtomList, AtomMarker, RingBoundary};
pub use error::SyntaxError;
pub(crate) use tokenizer::ring_marker_text;
pub use tokenizer::{tokenize, AtomKind, AtomToken, Token};

/// Runs the tokenizer and the first pass, returning the flat atom list with
/// its ring boundaries.
pub fn parse_atoms(s: &str) -> Result<AtomList, SyntaxError> {
    let tokens = tokenize(s)?;
    atoms::build_atom_list(&tokens)
}

/// Parses SMILES into a fragment tree whose `smiles()` reproduces the input.
pub fn parse(s: &str) -> Result<Fragment, Error> {
    let list = parse_atoms(s)?;
    if list.atoms.is_empty() {
        return Ok(Molecule::default().into());
    }
    let fragment = builder::build_fragment(&list);
    debug!(
        "parsed {} atoms, {} ring boundaries into {}",
        list.atoms.len(),
        list.rings.len(),
        fragment.kind()
    );
    Ok(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bond::Bond;

    fn roundtrip(s: &str) {
        let frag = parse(s).unwrap();
        assert_eq!(frag.smiles(), s, "round-trip of {s}");
    }

    // ---- AST shapes ----

    #[test]
    fn ethanol_is_linear() {
        let frag = parse("CCO").unwrap();
        let linear = frag.as_linear().unwrap();
        assert_eq!(linear.atoms(), ["C", "C", "O"]);
        assert!(linear.bonds().iter().all(Option::is_none));
        assert!(linear.attachments().is_empty());
        assert_eq!(frag.smiles(), "CCO");
    }

    #[test]
    fn benzene_is_a_ring() {
        let frag = parse("c1ccccc1").unwrap();
        let ring = frag.as_ring().unwrap();
        assert_eq!(ring.base_atom(), "c");
        assert_eq!(ring.size(), 6);
        assert_eq!(ring.ring_number(), 1);
        assert_eq!(frag.smiles(), "c1ccccc1");
    }

    #[test]
    fn pyridine_base_is_the_majority_element() {
        let frag = parse("n1ccccc1").unwrap();
        let ring = frag.as_ring().unwrap();
        assert_eq!(ring.base_atom(), "c");
        assert_eq!(ring.substitutions().get(&1).map(String::as_str), Some("n"));
        assert_eq!(ring.substitutions().len(), 1);
        assert_eq!(frag.smiles(), "n1ccccc1");
    }

    #[test]
    fn toluene_is_chain_then_ring() {
        let frag = parse("Cc1ccccc1").unwrap();
        let mol = frag.as_molecule().unwrap();
        assert_eq!(mol.len(), 2);
        assert_eq!(mol.components()[0].as_linear().unwrap().atoms(), ["C"]);
        let ring = mol.components()[1].as_ring().unwrap();
        assert_eq!((ring.size(), ring.base_atom()), (6, "c"));
        assert_eq!(frag.smiles(), "Cc1ccccc1");
    }

    #[test]
    fn decalin_is_fused() {
        let frag = parse("C1CC2CCCCC2CC1").unwrap();
        let fused = frag.as_fused_ring().unwrap();
        assert_eq!(fused.rings().len(), 2);
        assert_eq!(fused.rings()[0].size(), 6);
        assert_eq!(fused.rings()[1].size(), 6);
        assert_eq!(fused.rings()[1].offset(), 2);
        assert_eq!(fused.total_atoms(), 10);
        assert_eq!(frag.smiles(), "C1CC2CCCCC2CC1");
    }

    #[test]
    fn bond_between_components() {
        let frag = parse("C1CCCCC1=O").unwrap();
        let mol = frag.as_molecule().unwrap();
        assert_eq!(mol.components()[1].leading_bond(), Some(Bond::Double));
        assert_eq!(frag.smiles(), "C1CCCCC1=O");
    }

    #[test]
    fn empty_input_is_an_empty_molecule() {
        let frag = parse("").unwrap();
        assert!(frag.as_molecule().unwrap().is_empty());
        assert_eq!(frag.smiles(), "");
    }

    // ---- Round trips ----

    #[test]
    fn chains_and_branches() {
        for s in ["C", "CC(C)(C)C", "CC(=O)O", "C=C#N", "CC(C(C)C)C", "ClCBr", "[NH4+]C"] {
            roundtrip(s);
        }
    }

    #[test]
    fn rings_with_substituents() {
        for s in ["c1ccc(C)cc1", "C1CC(O)CC1", "c1ccccc1O", "Oc1ccccc1", "C1=CC=CC=C1"] {
            roundtrip(s);
        }
    }

    #[test]
    fn marker_spelling_is_kept() {
        for s in ["C%12CC%12", "C%05CC%05", "C=1CCCCC1", "C1CCCCC=1", "C(C)1CC1"] {
            roundtrip(s);
        }
    }

    #[test]
    fn closure_inside_a_branch() {
        for s in ["C1CC(C)(CC1)C", "C1CC(C(O)C1)", "C1C(CC)CC(C1)"] {
            roundtrip(s);
        }
    }

    #[test]
    fn fused_spiro_and_sequential() {
        for s in [
            "c1ccc2ccccc2c1",
            "C1CCC12CCC2",
            "c1ccccc1c1ccccc1",
            "C1CC2CCCCC2CC1C3CC3",
            "CCCCCC1=CC(=C(C(=C1)O)C2C=C(CCC2C(=C)C)C)O",
        ] {
            roundtrip(s);
        }
    }

    #[test]
    fn whitespace_is_dropped() {
        assert_eq!(parse(" C C O ").unwrap().smiles(), "CCO");
    }

    #[test]
    fn bond_before_branch_stays_outside() {
        let frag = parse("C=(O)C").unwrap();
        let linear = frag.as_linear().unwrap();
        assert!(linear.attachments_at(1)[0].bond_before_paren());
        for s in ["C=(O)C", "CC(C)=(O)O", "C1CC=(O)CC1", "C1CC=(CC1)C", "C(=O)C"] {
            roundtrip(s);
        }
    }

    #[test]
    fn marker_after_the_branch_that_opened_the_ring() {
        for s in ["CC(CC1)1", "C(C2CC1)1C2", "C=N1c(O=1(=c1O2C)23ONOc13)"] {
            roundtrip(s);
        }
    }

    #[test]
    fn ring_closed_behind_its_opener_keeps_its_size() {
        let frag = parse("CC(CC1)1").unwrap();
        let mol = frag.as_molecule().unwrap();
        let ring = mol.components()[1].as_ring().unwrap();
        assert_eq!(ring.size(), 3);
        assert_eq!(ring.base_atom(), "C");
        assert!(ring.has_metadata());
    }

    // ---- Errors ----

    #[test]
    fn unclosed_ring() {
        assert_eq!(
            parse("C1CCCC"),
            Err(Error::Syntax(SyntaxError::UnclosedRing { rings: vec![1] }))
        );
        let err = parse("C1CC2CC").unwrap_err();
        assert_eq!(err.to_string(), "unclosed rings 1, 2");
    }

    #[test]
    fn syntax_errors_carry_positions() {
        assert_eq!(
            parse("CC?"),
            Err(Error::Syntax(SyntaxError::UnknownCharacter { pos: 2, ch: '?' }))
        );
        assert_eq!(
            parse("C[NH4"),
            Err(Error::Syntax(SyntaxError::UnclosedBracket { pos: 1 }))
        );
        assert_eq!(
            parse("C%1C"),
            Err(Error::Syntax(SyntaxError::InvalidRingMarker { pos: 1 }))
        );
        assert_eq!(
            parse("CC.O"),
            Err(Error::Syntax(SyntaxError::Disconnected { pos: 2 }))
        );
    }
}
