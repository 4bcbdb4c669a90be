//! Usage: `use she::prelude::*;`

pub use crate::operations::{dot, sumprod, xor};
pub use crate::pir::{PirClient, PirServer};
pub use crate::{
    BitArray, Ciphertext, CiphertextArray, FilledCiphertextArray, Parameters, Plaintext,
    PublicKey, SecretKey, SheError,
};
