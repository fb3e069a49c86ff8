pub mod classifier;
pub mod driver;
pub mod mentions;
pub mod pipeline;
pub mod registry;
pub mod stage;
pub mod tagger;
