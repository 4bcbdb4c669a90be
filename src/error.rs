use thiserror::Error;

/// Errors reported by the engine.
///
/// Only misuse that can be detected cheaply is reported here.
/// Exceeding the noise budget is never detected: see [`crate::Ciphertext::noise_bits`].
#[derive(Debug, Error)]
pub enum SheError {
    #[error("invalid parameters: s = {s}, l = {l} (both must be strictly positive)")]
    InvalidParameter { s: u32, l: u32 },

    #[error("public key was not derived from this secret key")]
    KeyMismatch,

    #[error("width mismatch: expected {expected}, got {got}")]
    WidthMismatch { expected: usize, got: usize },

    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    #[error("slot {index} is out of range for an array of {capacity} ciphertexts")]
    SlotOutOfRange { index: usize, capacity: usize },

    #[error("slot {0} has already been written")]
    SlotOccupied(usize),

    #[error("slot {0} has not been written")]
    UnfilledSlot(usize),

    #[error("query index {index} is out of range for a database of {entries} records")]
    QueryOutOfRange { index: usize, entries: usize },

    #[error("{records} records cannot be indexed by a key of capacity {capacity}")]
    TooManyRecords { records: usize, capacity: usize },

    #[error("could not encode key: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("could not decode key: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

pub type Result<T> = core::result::Result<T, SheError>;
