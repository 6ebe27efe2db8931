//! Lexis - vocabulary packs with image-backed vocab entries.
//!
//! [`Lexis`] is the request-level entry point: it validates input, stores
//! uploaded images through [`lexis_blob`] and persists packs and vocabs through
//! [`lexis_db`].

pub mod config;
pub mod error;
pub mod flashcards;
pub mod service;

pub use config::LexisConfig;
pub use error::{ErrorKind, Failure, LexisError, Result};
pub use flashcards::{Flashcard, FlashcardLimit};
pub use service::{FlashcardRequest, Lexis, NewPack, NewVocab, PackDetails};

pub use lexis_blob::Upload;
pub use lexis_db::{Language, Pack, PackId, Vocab, VocabId};
