pub mod character;
pub mod mention;
pub mod movement;
