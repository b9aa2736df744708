//! Saved chat transcripts, one JSON document per chat id.

pub mod store;

pub use store::{StoreError, Transcript, TranscriptStore};
