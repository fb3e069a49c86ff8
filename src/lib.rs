//! Stage Annotator — entrance and exit inference for German drama texts.
//!
//! Reads TEI-XML plays, classifies each stage direction with an ordered
//! table of lexical rules, resolves the characters it names against the
//! play's person list, tracks who is on stage per scene, and writes
//! `type`/`who` attributes back onto the `stage` elements.

pub mod batch;
pub mod core;
pub mod schema;
pub mod tei;
