//! Bit-level private information retrieval on top of the homomorphic operators.
//!
//! The client encrypts the index of the record it wants; the server runs
//! [`sumprod`] against its index table to get an encrypted one-hot vector,
//! then [`dot`] against its records to select the wanted one, without ever
//! learning which. The client decrypts the answer.
//!
//! The server may split its records into disjoint shards. Each shard compares
//! the query against its own slice of the index range, so shards that do not
//! hold the record answer with an encrypted zero vector; XOR-folding every
//! shard answer gives back the record. Shards are evaluated in parallel.
//!
//! ```
//! use she::pir::{PirClient, PirServer};
//! use she::{BitArray, Plaintext, SecretKey};
//!
//! let records = Plaintext::from_rows((0..6).map(|i| BitArray::binary(i * 7, 8))).unwrap();
//!
//! let client = PirClient::new(SecretKey::generate(16, 3).unwrap(), records.entry_count()).unwrap();
//! let server = PirServer::with_shards(client.public_key().clone(), records, 2).unwrap();
//!
//! let query = client.query(4).unwrap();
//! let response = server.answer(&query).unwrap();
//! assert_eq!(client.decode(&response).to_usize(), 28);
//! ```

use std::ops::Range;

use rayon::prelude::*;

use crate::array::CiphertextArray;
use crate::bits::{BitArray, Plaintext};
use crate::error::{Result, SheError};
use crate::operations::{dot, sumprod, xor};
use crate::{Ciphertext, PublicKey, SecretKey};

fn index_capacity(index_width: usize) -> Option<usize> {
    u32::try_from(index_width)
        .ok()
        .and_then(|width| 1usize.checked_shl(width))
}

fn check_entries(entries: usize, index_width: usize) -> Result<()> {
    match index_capacity(index_width) {
        Some(capacity) if entries > capacity => Err(SheError::TooManyRecords {
            records: entries,
            capacity,
        }),
        _ => Ok(()),
    }
}

/// A contiguous slice of the database with the matching slice of the index table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shard {
    range: Range<usize>,
    indices: Plaintext,
    records: Plaintext,
}

impl Shard {
    #[must_use]
    /// Global indices of the records held by this shard.
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    #[must_use]
    pub const fn indices(&self) -> &Plaintext {
        &self.indices
    }

    #[must_use]
    pub const fn records(&self) -> &Plaintext {
        &self.records
    }

    /// Selects the queried record if this shard holds it, an encrypted zero vector otherwise.
    ///
    /// ## Errors
    ///
    /// Propagates the errors of [`sumprod`] and [`dot`].
    pub fn answer(&self, pk: &PublicKey, query: &Ciphertext) -> Result<Ciphertext> {
        let gamma = sumprod(pk, query, &self.indices)?;
        dot(pk, &gamma, &self.records)
    }
}

/// Splits `records` into at most `count` contiguous disjoint shards of near-equal size.
///
/// Index chunks are `index_width` bits wide and hold the global record indices.
///
/// ## Errors
///
/// Returns [`SheError::EmptyInput`] if there is no record or `count` is zero.
pub fn partition(records: &Plaintext, index_width: usize, count: usize) -> Result<Vec<Shard>> {
    if records.is_empty() {
        return Err(SheError::EmptyInput("records"));
    }
    if count == 0 {
        return Err(SheError::EmptyInput("shard count"));
    }

    let entries = records.entry_count();
    let size = entries.div_ceil(count.min(entries));

    let shards = (0..entries)
        .step_by(size)
        .map(|start| {
            let range = start..(start + size).min(entries);
            let records = Plaintext::from_rows(records.chunks()[range.clone()].iter().cloned())?;
            Ok(Shard {
                indices: Plaintext::index_range(range.clone(), index_width),
                range,
                records,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(shards)
}

/// The database holder. Only needs the public key.
#[derive(Clone, Debug)]
pub struct PirServer {
    pk: PublicKey,
    shards: Vec<Shard>,
    record_width: usize,
}

impl PirServer {
    /// Serves `records` as a single shard.
    ///
    /// ## Errors
    ///
    /// Returns [`SheError::EmptyInput`] if there is no record,
    /// and [`SheError::TooManyRecords`] if the key slot width cannot index every record.
    pub fn new(pk: PublicKey, records: Plaintext) -> Result<Self> {
        Self::with_shards(pk, records, 1)
    }

    /// Serves `records` split into `count` shards.
    ///
    /// ## Errors
    ///
    /// Returns [`SheError::EmptyInput`] if there is no record or `count` is zero,
    /// and [`SheError::TooManyRecords`] if the key slot width cannot index every record.
    pub fn with_shards(pk: PublicKey, records: Plaintext, count: usize) -> Result<Self> {
        let index_width = pk.parameters().l() as usize;
        check_entries(records.entry_count(), index_width)?;
        let shards = partition(&records, index_width, count)?;

        tracing::debug!(
            records = records.entry_count(),
            record_width = records.chunk_width(),
            shards = shards.len(),
            "PIR server ready"
        );

        Ok(Self {
            pk,
            shards,
            record_width: records.chunk_width(),
        })
    }

    #[must_use]
    pub fn shards(&self) -> &[Shard] {
        &self.shards
    }

    #[must_use]
    pub const fn record_width(&self) -> usize {
        self.record_width
    }

    /// Answers an encrypted query.
    ///
    /// With several shards, every shard is evaluated on its own worker
    /// and the answers are XOR-folded together.
    ///
    /// ## Errors
    ///
    /// Returns [`SheError::WidthMismatch`] if the query is not as wide as the key slot width.
    pub fn answer(&self, query: &Ciphertext) -> Result<Ciphertext> {
        if let [shard] = self.shards.as_slice() {
            return shard.answer(&self.pk, query);
        }

        let responses: Vec<Result<Ciphertext>> = self
            .shards
            .par_iter()
            .map(|shard| {
                let _span = tracing::debug_span!(
                    "pir_shard",
                    start = shard.range.start,
                    end = shard.range.end
                )
                .entered();
                shard.answer(&self.pk, query)
            })
            .collect();

        let mut array = CiphertextArray::allocate(self.shards.len());
        for (i, response) in responses.into_iter().enumerate() {
            array.write(i, response?)?;
        }
        xor(&self.pk, &array.seal()?, self.record_width)
    }
}

/// The querying side. Holds the secret key.
#[derive(Debug)]
pub struct PirClient {
    sk: SecretKey,
    pk: PublicKey,
    entries: usize,
}

impl PirClient {
    /// Creates a client for a database of `entries` records.
    ///
    /// ## Errors
    ///
    /// Returns [`SheError::TooManyRecords`] if the key slot width cannot index every record.
    pub fn new(sk: SecretKey, entries: usize) -> Result<Self> {
        check_entries(entries, sk.parameters().l() as usize)?;
        let pk = sk.public_key();
        Ok(Self { sk, pk, entries })
    }

    #[must_use]
    /// The evaluation key to hand over to the server.
    pub const fn public_key(&self) -> &PublicKey {
        &self.pk
    }

    /// Encrypts the index of the wanted record.
    ///
    /// ## Errors
    ///
    /// Returns [`SheError::QueryOutOfRange`] if `index` is not below the number of records.
    pub fn query(&self, index: usize) -> Result<Ciphertext> {
        if index >= self.entries {
            return Err(SheError::QueryOutOfRange {
                index,
                entries: self.entries,
            });
        }
        let width = self.pk.parameters().l() as usize;
        Ciphertext::encrypt(&self.pk, &self.sk, &BitArray::binary(index, width))
    }

    #[must_use]
    /// Decrypts the server response into the wanted record.
    pub fn decode(&self, response: &Ciphertext) -> BitArray {
        response.decrypt(&self.sk)
    }
}
