// ============ Auction Engine ============
// Single-slot auction for the right to become fee recipient over a future
// window. There is no phase enum: whether the recorded window is live or
// concluded is read off `window_end` against the caller-supplied time.
//
// A new bid is checked against ONE snapshot of the previous winner by three
// independent rules. Each rule that fires replaces the slot and sets the
// refund owed to the previous bidder; a later rule overwrites what an earlier
// one produced within the same call.

use au_amm_types::{Address, AuctionState};

use crate::error::AmmError;

/// A bid that already passed the contract's precondition checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BidRequest {
    pub bidder: Address,
    pub window_start: u64,
    pub rounds: u64,
    pub bid_amount: u64,
    pub deposit: u64,
}

impl BidRequest {
    pub fn to_state(&self) -> Result<AuctionState, AmmError> {
        let window_end = self
            .window_start
            .checked_add(self.rounds)
            .ok_or(AmmError::WindowOverflow)?;

        Ok(AuctionState {
            window_start: self.window_start,
            window_end,
            bidder: self.bidder,
            bid_amount: self.bid_amount,
            bonded_deposit: self.deposit,
        })
    }
}

/// Liquidity tokens owed back to a displaced bidder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Refund {
    pub recipient: Address,
    pub amount: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BidResolution {
    pub state: AuctionState,
    pub refund: Option<Refund>,
}

/// Evaluate `bid` against `snapshot`. `None` when no rule fires.
pub fn resolve_bid(
    snapshot: &AuctionState,
    bid: &BidRequest,
    now: u64,
) -> Result<Option<BidResolution>, AmmError> {
    let replacement = bid.to_state()?;
    let mut resolution = None;

    // Recorded window already concluded: take the slot outright
    if snapshot.window_end < now {
        resolution = Some(BidResolution { state: replacement.clone(), refund: None });
    }

    // Earlier start outbids
    if snapshot.window_start > bid.window_start {
        resolution = Some(BidResolution {
            state: replacement.clone(),
            refund: displacement_refund(snapshot, now)?,
        });
    }

    // Higher amount outbids
    if snapshot.bid_amount < bid.bid_amount {
        resolution = Some(BidResolution {
            state: replacement,
            refund: displacement_refund(snapshot, now)?,
        });
    }

    Ok(resolution)
}

/// `deposit - bid * (window_end - now)` for the snapshot's bidder.
///
/// An empty slot or a concluded window owes nothing. The charge is checked: a deposit smaller
/// than the charge aborts the call instead of wrapping.
pub fn displacement_refund(snapshot: &AuctionState, now: u64) -> Result<Option<Refund>, AmmError> {
    if snapshot.bidder.is_zero() || snapshot.is_expired(now) {
        return Ok(None);
    }

    let remaining = snapshot.window_end - now;
    let charge = snapshot
        .bid_amount
        .checked_mul(remaining)
        .ok_or(AmmError::RefundUnderflow)?;
    let amount = snapshot
        .bonded_deposit
        .checked_sub(charge)
        .ok_or(AmmError::RefundUnderflow)?;

    Ok(Some(Refund { recipient: snapshot.bidder, amount }))
}

/// Whether `candidate` may take over as fee recipient at `now`.
pub fn check_manager_claim(
    state: &AuctionState,
    candidate: &Address,
    now: u64,
) -> Result<(), AmmError> {
    if state.bidder.is_zero() || state.bidder != *candidate {
        return Err(AmmError::NotWinningBidder);
    }
    if state.window_start >= now {
        return Err(AmmError::WindowNotStarted);
    }
    Ok(())
}

// ============ Tests ============
