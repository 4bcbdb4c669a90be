use crate::bits::BitArray;
use crate::error::{Result, SheError};
use crate::sampling::{ceil_div_pow2, sample_range};
use crate::{PublicKey, SecretKey};

use num_bigint::BigUint;
use num_traits::One;
use rand::Rng;

/// An encrypted bit vector.
///
/// Each slot encrypts one bit as `q*p + 2*r + m` reduced modulo the public key,
/// where `p` is the secret key and `2*r + m` is the noise carrying the bit `m`
/// in its parity.
///
/// A ciphertext produced by an operator is a fresh value: operands are never consumed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ciphertext {
    slots: Vec<BigUint>,
    // Upper bound on the bit length of the noise of every slot
    noise: usize,
}

// Bounds shared by every bit of one encryption
struct Sampler<'a> {
    x0: &'a BigUint,
    p: BigUint,
    q_bound: BigUint,
    r_bound: BigUint,
}

impl Sampler<'_> {
    fn encrypt_bit<R: Rng>(&self, bit: bool, rng: &mut R) -> BigUint {
        let one = BigUint::one();
        let q = sample_range(&one, &self.q_bound, rng);
        let r = sample_range(&one, &self.r_bound, rng);
        (q * &self.p + (r << 1u32) + u32::from(bit)) % self.x0
    }
}

impl Ciphertext {
    pub(crate) const fn from_raw(slots: Vec<BigUint>, noise: usize) -> Self {
        Self { slots, noise }
    }

    pub(crate) fn slots(&self) -> &[BigUint] {
        &self.slots
    }

    #[must_use]
    /// Number of encrypted bits.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    /// Upper bound on the bit length of the noise of this ciphertext.
    ///
    /// Decryption is exact as long as it does not exceed
    /// [`Parameters::noise_capacity`](crate::Parameters::noise_capacity).
    /// Nothing in the engine enforces it: composing operators beyond the budget
    /// silently yields garbage on decryption.
    pub const fn noise_bits(&self) -> usize {
        self.noise
    }

    /// Encrypts a bit array.
    ///
    /// Encryption is probabilistic: encrypting the same bits twice gives different ciphertexts.
    ///
    /// ## Errors
    ///
    /// Returns [`SheError::KeyMismatch`] if `pk` was not derived from `sk`.
    ///
    /// ## Examples
    ///
    /// ```
    /// use she::{BitArray, Ciphertext, SecretKey};
    ///
    /// let sk = SecretKey::generate(16, 8).unwrap();
    /// let pk = sk.public_key();
    ///
    /// let message = BitArray::binary(42, 8);
    /// let ciphertext = Ciphertext::encrypt(&pk, &sk, &message).unwrap();
    /// assert_eq!(ciphertext.decrypt(&sk), message);
    /// ```
    pub fn encrypt(pk: &PublicKey, sk: &SecretKey, message: &BitArray) -> Result<Self> {
        Self::encrypt_with_rng(pk, sk, message, &mut rand::thread_rng())
    }

    /// Same as [`Ciphertext::encrypt`], drawing randomness from `rng`.
    ///
    /// ## Errors
    ///
    /// Returns [`SheError::KeyMismatch`] if `pk` was not derived from `sk`.
    pub fn encrypt_with_rng<R: Rng>(
        pk: &PublicKey,
        sk: &SecretKey,
        message: &BitArray,
        rng: &mut R,
    ) -> Result<Self> {
        if !pk.matches(sk) {
            return Err(SheError::KeyMismatch);
        }

        let parameters = pk.parameters();
        let p = sk.modulus();
        // q in [1, 2^gamma/p), r in [1, 2^s)
        let sampler = Sampler {
            x0: pk.modulus(),
            q_bound: ceil_div_pow2(parameters.public_bits(), &p),
            r_bound: BigUint::one() << parameters.s(),
            p,
        };

        let slots = message
            .iter()
            .map(|bit| sampler.encrypt_bit(bit, rng))
            .collect();

        tracing::trace!(bits = message.len(), "encrypted bit array");

        Ok(Self {
            slots,
            noise: parameters.s() as usize + 1,
        })
    }

    #[must_use]
    /// Decrypts the ciphertext.
    ///
    /// The result is only meaningful if the ciphertext was produced under `sk`
    /// and its noise stayed within budget.
    pub fn decrypt(&self, sk: &SecretKey) -> BitArray {
        let p = sk.modulus();
        self.slots.iter().map(|slot| (slot % &p).bit(0)).collect()
    }
}
