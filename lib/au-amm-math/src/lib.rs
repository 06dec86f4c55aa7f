// ============ AU-AMM Fixed-Point Math ============
// Integer-only ratio math shared by the liquidity, swap and auction engines.
// Operands and results are u64; products are carried in a 256-bit intermediate
// so no combination of u64 factors used by the pool can overflow mid-way.

use thiserror::Error;

// ============ Constants ============

/// Three decimal digits of fractional precision for every ratio in the pool.
pub const SCALE: u64 = 1_000;

// ============ Error Types ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("denominator product is zero")]
    DivisionByZero,
    #[error("result does not fit in 64 bits")]
    Overflow,
}

// ============ Scaled Ratio ============

/// Product of `numerators` divided by product of `denominators`, floored.
///
/// Empty lists multiply to one. Any zero denominator fails with
/// `DivisionByZero`; a product wider than 256 bits or a quotient above
/// `u64::MAX` fails with `Overflow`.
pub fn scaled_mul_div(numerators: &[u64], denominators: &[u64]) -> Result<u64, MathError> {
    if denominators.contains(&0) {
        return Err(MathError::DivisionByZero);
    }

    let denominator = product(denominators)?;
    let numerator = product(numerators)?;

    numerator
        .checked_div(denominator)
        .and_then(U256::to_u64)
        .ok_or(MathError::Overflow)
}

/// `(a * b) / c` with a wide intermediate.
pub fn mul_div(a: u64, b: u64, c: u64) -> Result<u64, MathError> {
    scaled_mul_div(&[a, b], &[c])
}

/// `a * b + c`, failing instead of wrapping.
pub fn checked_mul_add(a: u64, b: u64, c: u64) -> Result<u64, MathError> {
    a.checked_mul(b)
        .and_then(|ab| ab.checked_add(c))
        .ok_or(MathError::Overflow)
}

fn product(factors: &[u64]) -> Result<U256, MathError> {
    factors.iter().try_fold(U256::ONE, |acc, &factor| {
        acc.checked_mul_u64(factor).ok_or(MathError::Overflow)
    })
}

// ============ Integer Square Root (Newton's Method) ============

pub fn sqrt(x: u128) -> u128 {
    if x == 0 {
        return 0;
    }
    // (x + 1) / 2 without overflowing at u128::MAX
    let mut z = x / 2 + (x & 1);
    let mut y = x;
    while z < y {
        y = z;
        z = (x / z + z) / 2;
    }
    y
}

/// Floor of the square root of a u64.
pub fn integer_sqrt(x: u64) -> u64 {
    sqrt(x as u128) as u64
}

/// Floor of sqrt(a * b). The product is formed in 128 bits, so this never
/// overflows and the root always fits back into a u64.
pub fn sqrt_product(a: u64, b: u64) -> u64 {
    sqrt(a as u128 * b as u128) as u64
}

// ============ 256-bit Arithmetic Helpers ============

/// Multiply two u128 values, returning (hi, lo) as a 256-bit result.
pub fn wide_mul(a: u128, b: u128) -> (u128, u128) {
    let mask: u128 = u64::MAX as u128;
    let a_lo = a & mask;
    let a_hi = a >> 64;
    let b_lo = b & mask;
    let b_hi = b >> 64;

    // Partial products (each u64*u64 fits in u128)
    let p0 = a_lo * b_lo;
    let p1 = a_lo * b_hi;
    let p2 = a_hi * b_lo;
    let p3 = a_hi * b_hi;

    // Accumulate middle bits with carry tracking
    let mid = (p0 >> 64) + (p1 & mask) + (p2 & mask);
    let lo = (p0 & mask) | ((mid & mask) << 64);
    let hi = p3 + (p1 >> 64) + (p2 >> 64) + (mid >> 64);

    (hi, lo)
}

/// Unsigned 256-bit value, just wide enough for the pool's products.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct U256 {
    pub hi: u128,
    pub lo: u128,
}

impl U256 {
    pub const ZERO: U256 = U256 { hi: 0, lo: 0 };
    pub const ONE: U256 = U256 { hi: 0, lo: 1 };

    pub fn is_zero(&self) -> bool {
        self.hi == 0 && self.lo == 0
    }

    pub fn to_u64(self) -> Option<u64> {
        if self.hi != 0 || self.lo > u64::MAX as u128 {
            return None;
        }
        Some(self.lo as u64)
    }

    pub fn checked_mul_u64(self, factor: u64) -> Option<U256> {
        let (carry, lo) = wide_mul(self.lo, factor as u128);
        let hi = self.hi.checked_mul(factor as u128)?.checked_add(carry)?;
        Some(U256 { hi, lo })
    }

    /// Restoring long division. `None` only for a zero divisor.
    pub fn checked_div(self, divisor: U256) -> Option<U256> {
        if divisor.is_zero() {
            return None;
        }
        if self.hi == 0 && divisor.hi == 0 {
            return Some(U256 { hi: 0, lo: self.lo / divisor.lo });
        }
        if self < divisor {
            return Some(U256::ZERO);
        }

        let mut quotient = U256::ZERO;
        let mut remainder = U256::ZERO;
        for bit in (0..256u32).rev() {
            let (shifted, carry) = remainder.shl1();
            remainder = shifted;
            if self.bit(bit) {
                remainder.lo |= 1;
            }
            // A carried-out bit means the true remainder is >= 2^256 > divisor
            if carry || remainder >= divisor {
                remainder = remainder.wrapping_sub(divisor);
                quotient.set_bit(bit);
            }
        }
        Some(quotient)
    }

    fn shl1(self) -> (U256, bool) {
        let carry = self.hi >> 127 == 1;
        let shifted = U256 {
            hi: (self.hi << 1) | (self.lo >> 127),
            lo: self.lo << 1,
        };
        (shifted, carry)
    }

    fn wrapping_sub(self, rhs: U256) -> U256 {
        let (lo, borrow) = self.lo.overflowing_sub(rhs.lo);
        let hi = self.hi.wrapping_sub(rhs.hi).wrapping_sub(borrow as u128);
        U256 { hi, lo }
    }

    fn bit(&self, index: u32) -> bool {
        if index >= 128 {
            (self.hi >> (index - 128)) & 1 == 1
        } else {
            (self.lo >> index) & 1 == 1
        }
    }

    fn set_bit(&mut self, index: u32) {
        if index >= 128 {
            self.hi |= 1 << (index - 128);
        } else {
            self.lo |= 1 << index;
        }
    }
}

impl From<u128> for U256 {
    fn from(value: u128) -> Self {
        U256 { hi: 0, lo: value }
    }
}

// ============ Tests ============
