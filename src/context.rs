use crate::error::{Result, SheError};
use crate::sampling::{ceil_div_pow2, sample_odd_bits, sample_odd_below};

use std::fmt;

use bincode::{Decode, Encode};
use num_bigint::BigUint;
use num_traits::Zero;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use zeroize::Zeroize;

/// Parameters of the scheme.
///
/// ## Fields
///
/// * `s` - The security parameter, bounding the bit length of the encryption noise.
/// * `l` - The slot width, i.e. the number of bits of the index chunks the key is sized for.
///
/// ## Note
///
/// The secret key is an odd integer of `(s+3)*l` bits and the public key
/// a multiple of it of about `5*(s+3)*l/2` bits.
/// Homomorphic products add up the bit lengths of the noises while sums grow them
/// by one bit per doubling, so a `sumprod` over `l`-bit chunks ends up with
/// at most `l*(s+2)` bits of noise, below the secret key size.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Encode, Decode)]
pub struct Parameters {
    s: u32,
    l: u32,
}

impl Parameters {
    /// Creates a new set of parameters.
    ///
    /// ## Errors
    ///
    /// Returns [`SheError::InvalidParameter`] if `s` or `l` is zero,
    /// or if the key sizes they imply do not fit in a `u32`.
    ///
    /// ## Examples
    ///
    /// ```
    /// use she::Parameters;
    ///
    /// let parameters = Parameters::new(16, 8).unwrap();
    /// assert!(Parameters::new(0, 8).is_err());
    /// assert!(Parameters::new(u32::MAX, 2).is_err());
    /// ```
    pub fn new(s: u32, l: u32) -> Result<Self> {
        let fits = s
            .checked_add(3)
            .and_then(|v| v.checked_mul(l))
            .and_then(|v| v.checked_mul(5))
            .is_some();
        if s == 0 || l == 0 || !fits {
            return Err(SheError::InvalidParameter { s, l });
        }
        Ok(Self { s, l })
    }

    /// Parameters whose slot width can index `records` entries,
    /// i.e. the smallest `l` such that `2^l >= records` (at least 1).
    ///
    /// ## Errors
    ///
    /// Returns [`SheError::InvalidParameter`] if `s` is zero.
    pub fn for_records(s: u32, records: usize) -> Result<Self> {
        let l = records.next_power_of_two().trailing_zeros().max(1);
        Self::new(s, l)
    }

    #[must_use]
    pub const fn s(&self) -> u32 {
        self.s
    }

    #[must_use]
    pub const fn l(&self) -> u32 {
        self.l
    }

    #[must_use]
    /// Bit length of the secret key (eta).
    pub const fn secret_bits(&self) -> usize {
        (self.s as usize + 3) * self.l as usize
    }

    #[must_use]
    /// Nominal bit length of the public key (gamma).
    pub const fn public_bits(&self) -> usize {
        5 * (self.s as usize + 3) * self.l as usize / 2
    }

    #[must_use]
    /// Largest noise bit length that always decrypts correctly.
    ///
    /// The secret key is at least `2^(eta-1)`, so any noise of at most `eta-1` bits is below it.
    pub const fn noise_capacity(&self) -> usize {
        self.secret_bits() - 1
    }
}

/// The secret key.
///
/// Both encryption and decryption need it: the public key of this scheme
/// is an evaluation key for the homomorphic operators, not an encryption key.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey {
    parameters: Parameters,
    // Little-endian u32 digits of the odd modulus p
    p: Vec<u32>,
    // Seeds the derivation of the public key
    seed: [u8; 32],
}

#[derive(Encode, Decode)]
struct SecretKeyBytes {
    parameters: Parameters,
    p: Vec<u32>,
    seed: [u8; 32],
}

impl SecretKey {
    /// Generates a secret key.
    ///
    /// ## Errors
    ///
    /// Returns [`SheError::InvalidParameter`] if `s` or `l` is zero.
    ///
    /// ## Examples
    ///
    /// ```
    /// use she::SecretKey;
    ///
    /// let sk = SecretKey::generate(16, 8).unwrap();
    /// assert!(SecretKey::generate(16, 0).is_err());
    /// ```
    pub fn generate(s: u32, l: u32) -> Result<Self> {
        Self::generate_with_rng(s, l, &mut rand::thread_rng())
    }

    /// Same as [`SecretKey::generate`], drawing randomness from `rng`.
    ///
    /// ## Errors
    ///
    /// Returns [`SheError::InvalidParameter`] if `s` or `l` is zero.
    pub fn generate_with_rng<R: Rng>(s: u32, l: u32, rng: &mut R) -> Result<Self> {
        let parameters = Parameters::new(s, l)?;
        let p = sample_odd_bits(parameters.secret_bits(), rng);
        let mut seed = [0; 32];
        rng.fill(&mut seed);

        tracing::debug!(
            s = parameters.s(),
            l = parameters.l(),
            secret_bits = parameters.secret_bits(),
            public_bits = parameters.public_bits(),
            "generated secret key"
        );

        Ok(Self {
            parameters,
            p: p.to_u32_digits(),
            seed,
        })
    }

    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub(crate) fn modulus(&self) -> BigUint {
        BigUint::from_slice(&self.p)
    }

    #[must_use]
    /// Derives the public key.
    ///
    /// The derivation is deterministic: calling it twice on the same key yields the same public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::derive(self)
    }

    #[must_use]
    /// Tells whether the noise of `ciphertext` is small enough for decryption to be exact.
    ///
    /// This is only a diagnostic: decryption never checks it.
    pub fn has_noise_budget(&self, ciphertext: &crate::Ciphertext) -> bool {
        ciphertext.noise_bits() <= self.parameters.noise_capacity()
    }

    /// Encodes the secret key to bytes.
    ///
    /// ## Errors
    ///
    /// Returns [`SheError::Encode`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut raw = SecretKeyBytes {
            parameters: self.parameters,
            p: self.p.clone(),
            seed: self.seed,
        };
        let bytes = bincode::encode_to_vec(&raw, bincode::config::standard());
        raw.p.zeroize();
        raw.seed.zeroize();
        Ok(bytes?)
    }

    /// Decodes a secret key previously encoded with [`SecretKey::to_bytes`].
    ///
    /// ## Errors
    ///
    /// Returns [`SheError::Decode`] on malformed input,
    /// and [`SheError::InvalidParameter`] if the encoded parameters are invalid
    /// or the modulus is not an odd integer of the size they imply.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (mut raw, _): (SecretKeyBytes, usize) =
            bincode::decode_from_slice(bytes, bincode::config::standard())?;
        let parameters = Parameters::new(raw.parameters.s, raw.parameters.l)?;
        let modulus = BigUint::from_slice(&raw.p);
        raw.p.zeroize();
        if modulus.bits() as usize != parameters.secret_bits() || !modulus.bit(0) {
            return Err(SheError::InvalidParameter {
                s: parameters.s,
                l: parameters.l,
            });
        }
        // Normalized through BigUint so that equal keys compare equal
        let p = modulus.to_u32_digits();
        Ok(Self {
            parameters,
            p,
            seed: raw.seed,
        })
    }

    fn wipe(&mut self) {
        self.p.zeroize();
        self.seed.zeroize();
    }
}

/// The secret key is zeroized when dropped
/// because its content should not leak.
impl Drop for SecretKey {
    fn drop(&mut self) {
        self.wipe();
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// The public key, used as evaluation key by the homomorphic operators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    parameters: Parameters,
    x0: BigUint,
}

#[derive(Encode, Decode)]
struct PublicKeyBytes {
    parameters: Parameters,
    x0: Vec<u32>,
}

impl PublicKey {
    #[must_use]
    /// Derives the public key of `secret_key`: `x0 = q0*p` for a random odd `q0 < 2^gamma/p`.
    ///
    /// ## Examples
    ///
    /// ```
    /// use she::{PublicKey, SecretKey};
    ///
    /// let sk = SecretKey::generate(16, 8).unwrap();
    /// let pk = PublicKey::derive(&sk);
    /// assert_eq!(pk, sk.public_key());
    /// ```
    pub fn derive(secret_key: &SecretKey) -> Self {
        let parameters = *secret_key.parameters();
        let p = secret_key.modulus();
        let mut rng = ChaCha20Rng::from_seed(secret_key.seed);
        let q0 = sample_odd_below(&ceil_div_pow2(parameters.public_bits(), &p), &mut rng);
        let x0 = q0 * p;

        tracing::debug!(
            s = parameters.s(),
            l = parameters.l(),
            bits = x0.bits(),
            "derived public key"
        );

        Self { parameters, x0 }
    }

    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub(crate) const fn modulus(&self) -> &BigUint {
        &self.x0
    }

    /// Reduces a ciphertext slot modulo the public key, preserving its residue modulo the secret key.
    pub(crate) fn reduce(&self, slot: &BigUint) -> BigUint {
        slot % &self.x0
    }

    #[must_use]
    /// Tells whether this public key was derived from `secret_key`.
    pub fn matches(&self, secret_key: &SecretKey) -> bool {
        self.parameters == secret_key.parameters && (&self.x0 % secret_key.modulus()).is_zero()
    }

    /// Encodes the public key to bytes.
    ///
    /// ## Errors
    ///
    /// Returns [`SheError::Encode`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let raw = PublicKeyBytes {
            parameters: self.parameters,
            x0: self.x0.to_u32_digits(),
        };
        Ok(bincode::encode_to_vec(&raw, bincode::config::standard())?)
    }

    /// Decodes a public key previously encoded with [`PublicKey::to_bytes`].
    ///
    /// ## Errors
    ///
    /// Returns [`SheError::Decode`] on malformed input,
    /// and [`SheError::InvalidParameter`] if the encoded parameters are invalid
    /// or the modulus is zero.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (raw, _): (PublicKeyBytes, usize) =
            bincode::decode_from_slice(bytes, bincode::config::standard())?;
        let parameters = Parameters::new(raw.parameters.s, raw.parameters.l)?;
        let x0 = BigUint::from_slice(&raw.x0);
        if x0.is_zero() {
            return Err(SheError::InvalidParameter {
                s: parameters.s,
                l: parameters.l,
            });
        }
        Ok(Self { parameters, x0 })
    }
}
