// ============ Swap Engine ============
// Constant-product exchange with the fee skimmed off the input before pricing.

use au_amm_math::{checked_mul_add, mul_div, scaled_mul_div, MathError, SCALE};

use crate::error::AmmError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapQuote {
    /// Part of the input paid to the fee recipient.
    pub fee: u64,
    /// Part of the input that is priced against the reserves.
    pub net_in: u64,
    pub amount_out: u64,
}

/// Price `amount_in` against reserves observed before the deposit was credited.
pub fn quote_swap(
    amount_in: u64,
    fee_rate: u64,
    reserve_in: u64,
    reserve_out: u64,
) -> Result<SwapQuote, AmmError> {
    let fee = mul_div(amount_in, fee_rate, SCALE)?;
    let net_in = amount_in.checked_sub(fee).ok_or(MathError::Overflow)?;

    let scaled_reserve = reserve_in.checked_mul(SCALE).ok_or(MathError::Overflow)?;
    let denominator = checked_mul_add(net_in, SCALE, scaled_reserve)?;

    let amount_out = scaled_mul_div(&[net_in, SCALE, reserve_out], &[denominator])?;
    if amount_out == 0 {
        return Err(AmmError::NothingToSwap);
    }

    Ok(SwapQuote { fee, net_in, amount_out })
}

// ============ Tests ============
