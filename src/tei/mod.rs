pub mod document;

pub use document::{Division, DivisionKind, StageAttributes, StageRef, TeiDocument, TeiError};
