//! A somewhat homomorphic encryption engine for bit-level private information retrieval.
//!
//! ## Usage
//!
//! Plaintexts are represented as [`BitArray`]s, and databases as [`Plaintext`]s:
//! ordered sequences of bit arrays sharing one chunk width.
//!
//! A [`SecretKey`] is generated from two parameters: the security parameter `s`,
//! bounding the encryption noise, and the slot width `l`, the number of bits
//! of the indices it can query. The [`PublicKey`] is derived from it.
//!
//! Unlike usual public key schemes, encryption needs both keys: the public key
//! is an evaluation key, required by the homomorphic operators of [`operations`],
//! which never need the secret key.
//!
//! ## System
//!
//! Keys and ciphertexts are big integers.
//! The secret key is a random odd integer `p` of `(s+3)*l` bits,
//! the public key is a multiple `x0 = q0*p` of about `5*(s+3)*l/2` bits.
//! A bit `m` is encrypted as `q*p + 2*r + m mod x0` with `r` a random integer
//! in `[1, 2^s)`, and decrypted as the parity of the ciphertext modulo `p`.
//!
//! Adding ciphertexts XORs the underlying bits and multiplying them ANDs the bits.
//! Products multiply the noises `2*r + m`: as long as the noise stays below `p`,
//! decryption is exact. The engine does not check it, see [`Ciphertext::noise_bits`].
//!
//! ## Examples
//!
//! ### Basic usage
//!
//! ```
//! use she::{BitArray, Ciphertext, SecretKey};
//!
//! // ---------------------------------- s  l
//! let sk = SecretKey::generate(16, 8).unwrap();
//! let pk = sk.public_key();
//!
//! let message = BitArray::binary(42, 8);
//! let ciphertext = Ciphertext::encrypt(&pk, &sk, &message).unwrap();
//! assert_eq!(ciphertext.decrypt(&sk), message);
//! ```
//!
//! ### Private information retrieval
//!
//! ```
//! use she::operations::{dot, sumprod};
//! use she::{BitArray, Ciphertext, Plaintext, SecretKey};
//!
//! let sk = SecretKey::generate(16, 2).unwrap();
//! let pk = sk.public_key();
//!
//! // Server side
//! let data = Plaintext::from_rows([
//!     BitArray::binary(0xDE, 8),
//!     BitArray::binary(0xAD, 8),
//!     BitArray::binary(0xBE, 8),
//!     BitArray::binary(0xEF, 8),
//! ])
//! .unwrap();
//! let indices = Plaintext::index_table(4, 2);
//!
//! // The client queries the third record
//! let query = Ciphertext::encrypt(&pk, &sk, &BitArray::binary(2, 2)).unwrap();
//!
//! // The server selects it without knowing which one it is
//! let gamma = sumprod(&pk, &query, &indices).unwrap();
//! let response = dot(&pk, &gamma, &data).unwrap();
//!
//! assert_eq!(response.decrypt(&sk).to_usize(), 0xBE);
//! ```
//!
//! See [`pir`] for a ready-made client and server, including sharded databases.

pub mod array;
pub mod bits;
mod cipher;
mod context;
pub mod error;
pub mod operations;
pub mod pir;
pub mod prelude;
mod sampling;

pub use array::{CiphertextArray, FilledCiphertextArray};
pub use bits::{BitArray, Plaintext};
pub use cipher::Ciphertext;
pub use context::{Parameters, PublicKey, SecretKey};
pub use error::{Result, SheError};
