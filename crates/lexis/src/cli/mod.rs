//! Command-line interface for Lexis

pub mod check;
pub mod flashcards;
pub mod output;
pub mod packs;
pub mod vocab;
