// ============ Liquidity Engine ============
// Converts reserve deposits into liquidity-token issuance and back.
// Rounding always floors, so redemptions never pay out more than was put in.

use au_amm_math::{mul_div, sqrt_product, SCALE};
use au_amm_types::TOTAL_SUPPLY;

use crate::error::AmmError;

/// Liquidity tokens in circulation, given what the pool itself still holds.
pub fn issued_supply(pool_held: u64) -> Result<u64, AmmError> {
    TOTAL_SUPPLY.checked_sub(pool_held).ok_or(AmmError::SupplyUnderflow)
}

/// First deposit into an empty pool: the geometric mean of the two amounts.
pub fn initial_mint(amount_a: u64, amount_b: u64) -> u64 {
    sqrt_product(amount_a, amount_b)
}

/// Issuance for a deposit into a funded pool.
///
/// Each side's share of its prior reserve is taken at `SCALE` precision and the
/// smaller share wins, so an unbalanced deposit only earns credit for its
/// balanced part.
pub fn tokens_to_mint(
    issued: u64,
    prior_a: u64,
    prior_b: u64,
    amount_a: u64,
    amount_b: u64,
) -> Result<u64, AmmError> {
    let ratio_a = mul_div(amount_a, SCALE, prior_a)?;
    let ratio_b = mul_div(amount_b, SCALE, prior_b)?;
    let ratio = ratio_a.min(ratio_b);

    Ok(mul_div(ratio, issued, SCALE)?)
}

/// Pro-rata share of one reserve for `redeemed` liquidity tokens.
pub fn tokens_to_burn(issued: u64, reserve: u64, redeemed: u64) -> Result<u64, AmmError> {
    Ok(mul_div(reserve, redeemed, issued)?)
}

/// Reserve A per reserve B at `SCALE` precision.
pub fn price_ratio(reserve_a: u64, reserve_b: u64) -> Result<u64, AmmError> {
    Ok(mul_div(reserve_a, SCALE, reserve_b)?)
}

// ============ Tests ============
