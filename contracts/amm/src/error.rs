// ============ Contract Errors ============

use au_amm_math::MathError;
use au_amm_types::{AssetId, ConfigError};
use thiserror::Error;

use crate::host::HostError;

/// Coarse classification every rejection falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    PreconditionViolation,
    ArithmeticFailure,
    AuthorizationFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmmError {
    // Lifecycle
    #[error("pool has not been bootstrapped")]
    NotBootstrapped,
    #[error("pool is already bootstrapped")]
    AlreadyBootstrapped,
    #[error("invalid contract configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("host rejected the request: {0}")]
    Host(#[from] HostError),
    #[error("persisted contract records are malformed")]
    MalformedSnapshot,

    // Bootstrap
    #[error("reserve assets must be ordered with the lower id first")]
    UnorderedAssets,
    #[error("fee ceiling {0} is outside the allowed range")]
    InvalidFeeCeiling(u64),
    #[error("bootstrap seed payment is below the minimum")]
    InsufficientSeed,

    // Transfer records
    #[error("asset {0} is not the one this pool expects")]
    WrongAsset(AssetId),
    #[error("transfer sender is not the caller")]
    TransferSenderMismatch,
    #[error("transfer receiver is not the contract")]
    TransferReceiverMismatch,
    #[error("transfer amount must be positive")]
    ZeroTransfer,
    #[error("payment receiver is not the contract")]
    PaymentReceiverMismatch,

    // Governance
    #[error("fee rate {rate} exceeds the ceiling {max}")]
    FeeAboveCeiling { rate: u64, max: u64 },

    // Auction
    #[error("bid window must open more than the minimum lead time from now")]
    WindowTooSoon,
    #[error("bid must cover more than the minimum number of rounds")]
    TooFewRounds,
    #[error("bid amount must be positive")]
    ZeroBid,
    #[error("bond {bonded} does not cover {required}")]
    InsufficientBond { bonded: u64, required: u64 },
    #[error("bid neither starts earlier nor pays more than the current one")]
    BidNotWinning,
    #[error("winning window has not started yet")]
    WindowNotStarted,

    // Escrow
    #[error("escrow provisioning payment is not above the minimum")]
    InsufficientEscrowFee,

    // Arithmetic
    #[error("arithmetic failure: {0}")]
    Math(#[from] MathError),
    #[error("mint would issue no liquidity")]
    NothingToMint,
    #[error("swap would pay out nothing")]
    NothingToSwap,
    #[error("contract balance is lower than the credited transfer")]
    BalanceUnderflow,
    #[error("contract holds more liquidity tokens than were ever issued")]
    SupplyUnderflow,
    #[error("bond requirement overflows")]
    BondOverflow,
    #[error("bid window end overflows")]
    WindowOverflow,
    #[error("displaced bidder's charge exceeds their deposit")]
    RefundUnderflow,

    // Authorization
    #[error("caller is not the contract creator")]
    NotCreator,
    #[error("caller is not the fee recipient")]
    NotFeeRecipient,
    #[error("candidate is not the winning bidder")]
    NotWinningBidder,
}

impl AmmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AmmError::Math(_)
            | AmmError::NothingToMint
            | AmmError::NothingToSwap
            | AmmError::BalanceUnderflow
            | AmmError::SupplyUnderflow
            | AmmError::BondOverflow
            | AmmError::WindowOverflow
            | AmmError::RefundUnderflow => ErrorKind::ArithmeticFailure,

            AmmError::NotCreator | AmmError::NotFeeRecipient | AmmError::NotWinningBidder => {
                ErrorKind::AuthorizationFailure
            }

            _ => ErrorKind::PreconditionViolation,
        }
    }
}
