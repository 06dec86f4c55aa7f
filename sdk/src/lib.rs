// ============ AU-AMM SDK ============
// Client-side helpers for the AU-AMM pool contract:
// - CallBuilder: grouped transfers + method call for one user
// - Quotes: expected mint/burn/swap results from observed balances
// - CallEnvelope: JSON wire form of a call
// - MemoryHost: in-memory ledger that runs the contract end to end

pub mod envelope;
pub mod ledger;

use au_amm_contract::{liquidity, swap, AmmError, Host, HostError, SwapQuote};
use au_amm_types::{Address, AssetId, AssetTransfer, Call, Payment, PoolState};
use thiserror::Error;

pub use envelope::{format_address, parse_address, CallEnvelope, EnvelopeError};
pub use ledger::{derive_account, grouped_funds, AssetRecord, MemoryHost};

// ============ Errors ============

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SdkError {
    #[error(transparent)]
    Contract(#[from] AmmError),
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
    #[error("bond for {rounds} rounds at {bid_amount} per round overflows")]
    BondOverflow { rounds: u64, bid_amount: u64 },
    #[error("asset {0} is not a reserve of this pool")]
    NotAReserve(AssetId),
}

// ============ Call Builder ============

/// Builds calls signed by `user` against the contract at `app`.
#[derive(Clone, Copy, Debug)]
pub struct CallBuilder {
    pub app: Address,
    pub user: Address,
}

impl CallBuilder {
    pub fn new(app: Address, user: Address) -> Self {
        Self { app, user }
    }

    fn transfer(&self, asset: AssetId, amount: u64) -> AssetTransfer {
        AssetTransfer { asset, amount, sender: self.user, receiver: self.app }
    }

    fn payment(&self, amount: u64) -> Payment {
        Payment { amount, sender: self.user, receiver: self.app }
    }

    pub fn bootstrap(&self, seed: u64, asset_a: AssetId, asset_b: AssetId, max_fee: u64) -> Call {
        Call::Bootstrap { seed: self.payment(seed), asset_a, asset_b, max_fee }
    }

    pub fn mint(&self, pool: &PoolState, amount_a: u64, amount_b: u64) -> Call {
        Call::Mint {
            a_xfer: self.transfer(pool.asset_a, amount_a),
            b_xfer: self.transfer(pool.asset_b, amount_b),
            liquidity_token: pool.liquidity_token,
            asset_a: pool.asset_a,
            asset_b: pool.asset_b,
        }
    }

    pub fn burn(&self, pool: &PoolState, amount: u64) -> Call {
        Call::Burn {
            liquidity_xfer: self.transfer(pool.liquidity_token, amount),
            liquidity_token: pool.liquidity_token,
            asset_a: pool.asset_a,
            asset_b: pool.asset_b,
        }
    }

    pub fn swap(
        &self,
        pool: &PoolState,
        asset_in: AssetId,
        amount_in: u64,
    ) -> Result<Call, SdkError> {
        if !pool.is_reserve(asset_in) {
            return Err(SdkError::NotAReserve(asset_in));
        }
        Ok(Call::Swap {
            xfer: self.transfer(asset_in, amount_in),
            asset_a: pool.asset_a,
            asset_b: pool.asset_b,
        })
    }

    /// Bid bonding exactly `bid_amount * rounds` liquidity tokens.
    pub fn bid(
        &self,
        pool: &PoolState,
        window_start: u64,
        rounds: u64,
        bid_amount: u64,
    ) -> Result<Call, SdkError> {
        let bond = bid_amount
            .checked_mul(rounds)
            .ok_or(SdkError::BondOverflow { rounds, bid_amount })?;
        Ok(Call::Bid {
            liquidity_token: pool.liquidity_token,
            rounds,
            bid_amount,
            window_start,
            bond: self.transfer(pool.liquidity_token, bond),
        })
    }

    /// Claim the fee-recipient role for this user.
    pub fn set_manager(&self) -> Call {
        Call::SetManager { candidate: self.user }
    }

    pub fn set_new_fee(&self, rate: u64) -> Call {
        Call::SetNewFee { rate }
    }

    pub fn provision_escrow(&self, payment: u64) -> Call {
        Call::ProvisionEscrow { payment: self.payment(payment) }
    }
}

// ============ Quotes ============

/// What the contract account holds before a call's transfers are credited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolBalances {
    pub reserve_a: u64,
    pub reserve_b: u64,
    /// Liquidity tokens still held by the contract.
    pub liquidity_held: u64,
}

impl PoolBalances {
    pub fn observe<H: Host + ?Sized>(host: &H, pool: &PoolState) -> Self {
        let app = host.app_address();
        Self {
            reserve_a: host.asset_balance(&app, pool.asset_a),
            reserve_b: host.asset_balance(&app, pool.asset_b),
            liquidity_held: host.asset_balance(&app, pool.liquidity_token),
        }
    }

    pub fn issued(&self) -> Result<u64, AmmError> {
        liquidity::issued_supply(self.liquidity_held)
    }
}

/// Liquidity tokens a deposit of `amount_a`/`amount_b` would mint.
pub fn quote_mint(balances: &PoolBalances, amount_a: u64, amount_b: u64) -> Result<u64, AmmError> {
    if balances.reserve_a == 0 && balances.reserve_b == 0 {
        return Ok(liquidity::initial_mint(amount_a, amount_b));
    }
    liquidity::tokens_to_mint(
        balances.issued()?,
        balances.reserve_a,
        balances.reserve_b,
        amount_a,
        amount_b,
    )
}

/// Reserve amounts returned for redeeming `amount` liquidity tokens.
pub fn quote_burn(balances: &PoolBalances, amount: u64) -> Result<(u64, u64), AmmError> {
    let issued = balances.issued()?;
    Ok((
        liquidity::tokens_to_burn(issued, balances.reserve_a, amount)?,
        liquidity::tokens_to_burn(issued, balances.reserve_b, amount)?,
    ))
}

/// Fee and payout for swapping `amount_in` of `asset_in` at the pool's current fee.
pub fn quote_swap(
    balances: &PoolBalances,
    pool: &PoolState,
    asset_in: AssetId,
    amount_in: u64,
) -> Result<SwapQuote, SdkError> {
    let (reserve_in, reserve_out) = if asset_in == pool.asset_a {
        (balances.reserve_a, balances.reserve_b)
    } else if asset_in == pool.asset_b {
        (balances.reserve_b, balances.reserve_a)
    } else {
        return Err(SdkError::NotAReserve(asset_in));
    };
    Ok(swap::quote_swap(amount_in, pool.current_fee, reserve_in, reserve_out)?)
}

// ============ Tests ============
