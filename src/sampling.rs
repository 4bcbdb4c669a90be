use num_bigint::{BigUint, RandBigInt};
use num_traits::One;
use rand::Rng;

/// Uniformly random odd integer of exactly `bits` bits, i.e. in `[2^(bits-1), 2^bits)`.
///
/// `bits` must be at least 2.
pub fn sample_odd_bits<R: Rng>(bits: usize, rng: &mut R) -> BigUint {
    debug_assert!(bits >= 2);
    let top = BigUint::one() << (bits - 1);
    rng.gen_biguint(bits as u64 - 1) | top | BigUint::one()
}

/// Uniformly random integer in `[low, high)`.
pub fn sample_range<R: Rng>(low: &BigUint, high: &BigUint, rng: &mut R) -> BigUint {
    rng.gen_biguint_range(low, high)
}

/// Uniformly random odd integer in `[1, high)`.
///
/// `high` must be at least 2.
pub fn sample_odd_below<R: Rng>(high: &BigUint, rng: &mut R) -> BigUint {
    // k in [0, floor(high/2)) gives 2k+1 < high
    let count = high >> 1u32;
    (rng.gen_biguint_below(&count) << 1u32) | BigUint::one()
}

/// `ceil(2^bits / divisor)`.
pub fn ceil_div_pow2(bits: usize, divisor: &BigUint) -> BigUint {
    ((BigUint::one() << bits) + divisor - 1u32) / divisor
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::thread_rng;

    #[test]
    fn test_sample_odd_bits() {
        let mut rng = thread_rng();
        for bits in [2, 7, 64, 65, 300] {
            let x = sample_odd_bits(bits, &mut rng);
            assert_eq!(x.bits(), bits as u64);
            assert!(x.bit(0));
        }
    }

    #[test]
    fn test_sample_range() {
        let mut rng = thread_rng();
        let low = BigUint::from(10u32);
        let high = BigUint::from(13u32);
        for _ in 0..50 {
            let x = sample_range(&low, &high, &mut rng);
            assert!(x >= low && x < high);
        }
    }

    #[test]
    fn test_sample_odd_below() {
        let mut rng = thread_rng();
        for high in [2u32, 3, 4, 1000] {
            let high = BigUint::from(high);
            for _ in 0..20 {
                let x = sample_odd_below(&high, &mut rng);
                assert!(x.bit(0));
                assert!(x < high);
            }
        }
    }

    #[test]
    fn test_ceil_div_pow2() {
        assert_eq!(ceil_div_pow2(5, &BigUint::from(8u32)), BigUint::from(4u32));
        assert_eq!(ceil_div_pow2(5, &BigUint::from(15u32)), BigUint::from(3u32));
        assert_eq!(ceil_div_pow2(0, &BigUint::from(3u32)), BigUint::one());
    }
}
