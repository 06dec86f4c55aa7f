// ============ AU-AMM Pool Contract ============
// Two-asset constant-product pool with a tradable fee-recipient role.
//
// - Bootstrap (liquidity token creation, reserve pair, fee ceiling)
// - Mint / burn of liquidity tokens against both reserves
// - Swap with the fee paid out to the current fee recipient
// - Auction for the fee-recipient slot over a future window
// - Escrow accounts that receive fee payouts on a requester's behalf
//
// The contract never moves funds itself. Every method returns a Receipt whose
// instructions the host executes atomically with the state change.

pub mod auction;
pub mod contract;
pub mod error;
pub mod escrow;
pub mod host;
pub mod liquidity;
pub mod swap;

pub use auction::{BidRequest, BidResolution, Refund};
pub use contract::{
    liquidity_token_params, AmmContract, BurnOutcome, CallOutput, ContractState, MintOutcome,
    Receipt, StateSnapshot, SwapOutcome,
};
pub use error::{AmmError, ErrorKind};
pub use escrow::EscrowRegistry;
pub use host::{Host, HostError};
pub use swap::{quote_swap, SwapQuote};
