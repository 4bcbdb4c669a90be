//! Homomorphic operators of the PIR circuit.
//!
//! All of them only need the public key, used as an evaluation key:
//!
//! - [`sumprod`] turns an encrypted index into an encrypted one-hot selection vector ("gamma"),
//! - [`dot`] applies a selection vector to a plaintext table to select one record,
//! - [`xor`] folds several ciphertexts of the same width together.
//!
//! Operators are pure: they never modify their operands and return a fresh ciphertext.
//!
//! ## Noise
//!
//! The noise of a slot is its residue modulo the secret key. Products multiply
//! noises, so their bit lengths add up, while a sum of `n` ciphertexts grows
//! the bit length by at most `ceil(log2(n))`.
//! `sumprod` over `w`-bit chunks turns a query noise of `b` bits into `w*(b+1)` bits.
//! For fresh queries and `w` equal to the slot width `l` of the key, this is
//! `l*(s+2)` bits, below the `l*(s+3)` bits of the secret key.
//! Deeper compositions are the caller's responsibility: exceeding the budget
//! is not detected and decrypts to garbage.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use rayon::prelude::*;

use crate::array::FilledCiphertextArray;
use crate::bits::{BitArray, Plaintext};
use crate::error::{Result, SheError};
use crate::{Ciphertext, PublicKey};

// Bits added to the noise bound by a sum of `n` terms.
fn sum_growth(n: usize) -> usize {
    n.next_power_of_two().trailing_zeros() as usize
}

// AND over the bits of XNOR(query bit, table bit):
// a + beta + 1 encrypts 1 exactly when the bits are equal.
fn equality(pk: &PublicKey, query: &[BigUint], row: &BitArray) -> BigUint {
    query
        .iter()
        .zip(row.iter())
        .fold(BigUint::one(), |acc, (a, beta)| {
            let factor = a + (u32::from(beta) + 1);
            pk.reduce(&(acc * factor))
        })
}

/// Compares an encrypted index against every entry of a plaintext index table.
///
/// Slot `i` of the result decrypts to 1 if the query equals chunk `i` of `indices`, to 0 otherwise.
/// With `indices` built by [`Plaintext::index_table`] and a query within range,
/// the result is the encrypted one-hot vector of the query.
///
/// ## Errors
///
/// Returns [`SheError::EmptyInput`] if the table is empty,
/// and [`SheError::WidthMismatch`] if the query is not as wide as the table chunks.
///
/// ## Examples
///
/// ```
/// use she::{operations, BitArray, Ciphertext, Plaintext, SecretKey};
///
/// let sk = SecretKey::generate(16, 3).unwrap();
/// let pk = sk.public_key();
///
/// let query = Ciphertext::encrypt(&pk, &sk, &BitArray::binary(5, 3)).unwrap();
/// let gamma = operations::sumprod(&pk, &query, &Plaintext::index_table(8, 3)).unwrap();
/// assert_eq!(gamma.decrypt(&sk), BitArray::one_hot(5, 8));
/// ```
pub fn sumprod(pk: &PublicKey, query: &Ciphertext, indices: &Plaintext) -> Result<Ciphertext> {
    if indices.is_empty() {
        return Err(SheError::EmptyInput("index table"));
    }
    if query.len() != indices.chunk_width() {
        return Err(SheError::WidthMismatch {
            expected: indices.chunk_width(),
            got: query.len(),
        });
    }

    let slots: Vec<BigUint> = indices
        .chunks()
        .par_iter()
        .map(|row| equality(pk, query.slots(), row))
        .collect();
    let noise = (query.noise_bits() + 1) * indices.chunk_width();

    tracing::debug!(
        rows = indices.entry_count(),
        width = indices.chunk_width(),
        noise,
        "sumprod"
    );

    Ok(Ciphertext::from_raw(slots, noise))
}

/// Applies an encrypted selection vector to a plaintext table.
///
/// Bit `j` of the result is the sum of `gamma[i]` over the rows `i` whose bit `j` is set.
/// When `gamma` is one-hot on `k`, the result encrypts row `k`.
///
/// ## Errors
///
/// Returns [`SheError::EmptyInput`] if the table is empty,
/// and [`SheError::WidthMismatch`] if `gamma` does not have one slot per row.
pub fn dot(pk: &PublicKey, gamma: &Ciphertext, data: &Plaintext) -> Result<Ciphertext> {
    if data.is_empty() {
        return Err(SheError::EmptyInput("data table"));
    }
    if gamma.len() != data.entry_count() {
        return Err(SheError::WidthMismatch {
            expected: data.entry_count(),
            got: gamma.len(),
        });
    }

    let slots: Vec<BigUint> = (0..data.chunk_width())
        .into_par_iter()
        .map(|j| {
            let acc = data
                .chunks()
                .iter()
                .zip(gamma.slots())
                .filter(|(row, _)| row.get(j))
                .fold(BigUint::zero(), |acc, (_, g)| acc + g);
            pk.reduce(&acc)
        })
        .collect();
    let noise = gamma.noise_bits() + sum_growth(data.entry_count());

    tracing::debug!(
        rows = data.entry_count(),
        width = data.chunk_width(),
        noise,
        "dot"
    );

    Ok(Ciphertext::from_raw(slots, noise))
}

/// XORs together every ciphertext of `ciphertexts`, each encrypting `width` bits.
///
/// ## Errors
///
/// Returns [`SheError::EmptyInput`] if the array is empty or `width` is zero,
/// and [`SheError::WidthMismatch`] if a ciphertext is not `width` bits wide.
///
/// ## Examples
///
/// ```
/// use she::{operations, BitArray, Ciphertext, CiphertextArray, SecretKey};
///
/// let sk = SecretKey::generate(16, 4).unwrap();
/// let pk = sk.public_key();
///
/// let mut array = CiphertextArray::allocate(2);
/// array.write(0, Ciphertext::encrypt(&pk, &sk, &BitArray::binary(0b1100, 4)).unwrap()).unwrap();
/// array.write(1, Ciphertext::encrypt(&pk, &sk, &BitArray::binary(0b1010, 4)).unwrap()).unwrap();
///
/// let folded = operations::xor(&pk, &array.seal().unwrap(), 4).unwrap();
/// assert_eq!(folded.decrypt(&sk), BitArray::binary(0b0110, 4));
/// ```
pub fn xor(pk: &PublicKey, ciphertexts: &FilledCiphertextArray, width: usize) -> Result<Ciphertext> {
    if ciphertexts.is_empty() {
        return Err(SheError::EmptyInput("ciphertext array"));
    }
    if width == 0 {
        return Err(SheError::EmptyInput("ciphertext width"));
    }
    if let Some(c) = ciphertexts.iter().find(|c| c.len() != width) {
        return Err(SheError::WidthMismatch {
            expected: width,
            got: c.len(),
        });
    }

    let slots: Vec<BigUint> = (0..width)
        .map(|j| {
            let acc = ciphertexts
                .iter()
                .fold(BigUint::zero(), |acc, c| acc + &c.slots()[j]);
            pk.reduce(&acc)
        })
        .collect();
    let noise = ciphertexts
        .iter()
        .map(Ciphertext::noise_bits)
        .max()
        .unwrap_or(0)
        + sum_growth(ciphertexts.len());

    tracing::debug!(count = ciphertexts.len(), width, noise, "xor");

    Ok(Ciphertext::from_raw(slots, noise))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SecretKey;

    use rand::{thread_rng, Rng};

    fn keys(s: u32, l: u32) -> (SecretKey, PublicKey) {
        let sk = SecretKey::generate(s, l).unwrap();
        let pk = sk.public_key();
        (sk, pk)
    }

    #[test]
    fn test_sumprod() {
        let (sk, pk) = keys(16, 3);
        let indices = Plaintext::index_table(8, 3);

        for k in 0..8 {
            let query = Ciphertext::encrypt(&pk, &sk, &BitArray::binary(k, 3)).unwrap();
            let gamma = sumprod(&pk, &query, &indices).unwrap();
            assert_eq!(gamma.decrypt(&sk), BitArray::one_hot(k, 8));
            assert!(sk.has_noise_budget(&gamma));
        }
    }

    #[test]
    fn test_sumprod_partial_table() {
        // Table shorter than 2^l, query out of the table matches nothing
        let (sk, pk) = keys(16, 4);
        let indices = Plaintext::index_table(10, 4);

        let query = Ciphertext::encrypt(&pk, &sk, &BitArray::binary(7, 4)).unwrap();
        let gamma = sumprod(&pk, &query, &indices).unwrap();
        assert_eq!(gamma.decrypt(&sk), BitArray::one_hot(7, 10));

        let query = Ciphertext::encrypt(&pk, &sk, &BitArray::binary(12, 4)).unwrap();
        let gamma = sumprod(&pk, &query, &indices).unwrap();
        assert_eq!(gamma.decrypt(&sk).count_ones(), 0);
    }

    #[test]
    fn test_sumprod_noise() {
        let (sk, pk) = keys(16, 3);
        let query = Ciphertext::encrypt(&pk, &sk, &BitArray::binary(1, 3)).unwrap();
        let gamma = sumprod(&pk, &query, &Plaintext::index_table(4, 3)).unwrap();
        assert_eq!(gamma.noise_bits(), 3 * (17 + 1));
        assert!(gamma.noise_bits() <= pk.parameters().noise_capacity());

        let data = Plaintext::index_table(4, 5);
        let record = dot(&pk, &gamma, &data).unwrap();
        assert_eq!(record.noise_bits(), 3 * 18 + 2);
    }

    #[test]
    fn test_sumprod_errors() {
        let (sk, pk) = keys(16, 3);
        let query = Ciphertext::encrypt(&pk, &sk, &BitArray::binary(1, 3)).unwrap();

        assert!(matches!(
            sumprod(&pk, &query, &Plaintext::new(3)),
            Err(SheError::EmptyInput(_))
        ));
        assert!(matches!(
            sumprod(&pk, &query, &Plaintext::index_table(4, 2)),
            Err(SheError::WidthMismatch { expected: 2, got: 3 })
        ));
    }

    #[test]
    fn test_dot_unit_vectors() {
        let (sk, pk) = keys(16, 3);
        let mut rng = thread_rng();
        let data = Plaintext::from_rows(
            (0..5).map(|_| (0..12).map(|_| rng.gen::<bool>()).collect::<Vec<_>>()),
        )
        .unwrap();

        for k in 0..5 {
            let gamma = Ciphertext::encrypt(&pk, &sk, &BitArray::one_hot(k, 5)).unwrap();
            let record = dot(&pk, &gamma, &data).unwrap();
            assert_eq!(&record.decrypt(&sk), data.chunk(k));
        }
    }

    #[test]
    fn test_dot_sums_selected_rows() {
        let (sk, pk) = keys(16, 2);
        let data = Plaintext::from_rows([
            BitArray::from(&[1u8, 1, 0, 0][..]),
            BitArray::from(&[1u8, 0, 1, 0][..]),
            BitArray::from(&[0u8, 0, 0, 1][..]),
        ])
        .unwrap();

        let gamma = Ciphertext::encrypt(&pk, &sk, &BitArray::from(&[1u8, 1, 0][..])).unwrap();
        let record = dot(&pk, &gamma, &data).unwrap();
        assert_eq!(record.decrypt(&sk), BitArray::from(&[0u8, 1, 1, 0][..]));

        let gamma = Ciphertext::encrypt(&pk, &sk, &BitArray::new(3)).unwrap();
        assert_eq!(dot(&pk, &gamma, &data).unwrap().decrypt(&sk), BitArray::new(4));
    }

    #[test]
    fn test_dot_errors() {
        let (sk, pk) = keys(16, 2);
        let gamma = Ciphertext::encrypt(&pk, &sk, &BitArray::one_hot(0, 3)).unwrap();

        assert!(matches!(
            dot(&pk, &gamma, &Plaintext::new(4)),
            Err(SheError::EmptyInput(_))
        ));
        assert!(matches!(
            dot(&pk, &gamma, &Plaintext::index_table(4, 2)),
            Err(SheError::WidthMismatch { expected: 4, got: 3 })
        ));
    }

    #[test]
    fn test_xor() {
        let (sk, pk) = keys(16, 8);
        let rows = [
            [0u8, 1, 0, 1, 1, 0, 1, 0],
            [1, 0, 0, 1, 0, 0, 0, 0],
            [0, 1, 1, 0, 0, 1, 1, 0],
            [1, 1, 0, 1, 0, 0, 1, 1],
        ];

        let ciphertexts: FilledCiphertextArray = rows
            .iter()
            .map(|row| Ciphertext::encrypt(&pk, &sk, &BitArray::from(&row[..])).unwrap())
            .collect();
        let folded = xor(&pk, &ciphertexts, 8).unwrap();

        let expected = rows
            .iter()
            .map(|row| BitArray::from(&row[..]))
            .try_fold(BitArray::new(8), |acc, row| acc.xor(&row))
            .unwrap();
        assert_eq!(expected, BitArray::from(&[0u8, 1, 1, 1, 1, 1, 1, 1][..]));
        assert_eq!(folded.decrypt(&sk), expected);
    }

    #[test]
    fn test_xor_pairs_cancel() {
        let (sk, pk) = keys(16, 4);
        let message = BitArray::binary(0b1011, 4);
        let ciphertexts: FilledCiphertextArray = (0..2)
            .map(|_| Ciphertext::encrypt(&pk, &sk, &message).unwrap())
            .collect();
        assert_eq!(xor(&pk, &ciphertexts, 4).unwrap().decrypt(&sk), BitArray::new(4));
    }

    #[test]
    fn test_xor_errors() {
        let (sk, pk) = keys(16, 4);
        let empty = FilledCiphertextArray::default();
        assert!(matches!(xor(&pk, &empty, 4), Err(SheError::EmptyInput(_))));

        let ciphertexts: FilledCiphertextArray = [3, 5]
            .iter()
            .map(|&n| Ciphertext::encrypt(&pk, &sk, &BitArray::new(n)).unwrap())
            .collect();
        assert!(matches!(xor(&pk, &ciphertexts, 0), Err(SheError::EmptyInput(_))));
        assert!(matches!(
            xor(&pk, &ciphertexts, 3),
            Err(SheError::WidthMismatch { expected: 3, got: 5 })
        ));
    }

    #[test]
    fn test_operands_untouched() {
        let (sk, pk) = keys(16, 3);
        let query = Ciphertext::encrypt(&pk, &sk, &BitArray::binary(2, 3)).unwrap();
        let before = query.clone();
        let _ = sumprod(&pk, &query, &Plaintext::index_table(8, 3)).unwrap();
        assert_eq!(query, before);
    }
}
