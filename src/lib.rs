pub mod arbiter;
pub mod bond;
pub mod codegen;
pub mod error;
pub mod fragment;
pub mod graph;
pub mod rings;
pub mod smiles;
pub mod validate;

pub use bond::Bond;
pub use error::{Error, StructuralError, UsageError};
pub use fragment::{
    AttachOptions, Fragment, FusedRing, FusedRingOptions, FusedRings, FusedRingsOptions, Join,
    Linear, Molecule, ParserMetadata, RawFragment, Ring, RingSpec, Substituent,
};
pub use smiles::{parse, parse_atoms, tokenize, SyntaxError, Token};
pub use validate::{CommandValidator, GraphValidator, SmilesValidator, Verdict};

#[cfg(test)]
mod tests;
