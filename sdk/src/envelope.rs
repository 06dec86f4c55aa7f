// ============ Call Envelopes ============
// JSON wire form of a contract call. Addresses travel as 64-char hex strings
// (an optional 0x prefix is accepted), asset ids as plain integers.

use au_amm_types::{Address, AssetId, AssetTransfer, Call, Payment};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("address is not valid hex: {0}")]
    InvalidHex(String),
    #[error("address must be 32 bytes, got {0}")]
    InvalidLength(usize),
    #[error("malformed envelope: {0}")]
    Json(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TransferEnvelope {
    pub asset: u64,
    pub amount: u64,
    pub sender: String,
    pub receiver: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PaymentEnvelope {
    pub amount: u64,
    pub sender: String,
    pub receiver: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum CallEnvelope {
    Bootstrap {
        seed: PaymentEnvelope,
        asset_a: u64,
        asset_b: u64,
        max_fee: u64,
    },
    Mint {
        a_xfer: TransferEnvelope,
        b_xfer: TransferEnvelope,
        liquidity_token: u64,
        asset_a: u64,
        asset_b: u64,
    },
    Burn {
        liquidity_xfer: TransferEnvelope,
        liquidity_token: u64,
        asset_a: u64,
        asset_b: u64,
    },
    Swap {
        xfer: TransferEnvelope,
        asset_a: u64,
        asset_b: u64,
    },
    Bid {
        liquidity_token: u64,
        rounds: u64,
        bid_amount: u64,
        window_start: u64,
        bond: TransferEnvelope,
    },
    SetManager {
        candidate: String,
    },
    SetNewFee {
        rate: u64,
    },
    ProvisionEscrow {
        payment: PaymentEnvelope,
    },
}

impl CallEnvelope {
    pub fn to_json(&self) -> Result<String, EnvelopeError> {
        serde_json::to_string_pretty(self).map_err(|e| EnvelopeError::Json(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, EnvelopeError> {
        serde_json::from_str(json).map_err(|e| EnvelopeError::Json(e.to_string()))
    }
}

// ============ Address Encoding ============

pub fn format_address(address: &Address) -> String {
    address.to_string()
}

pub fn parse_address(text: &str) -> Result<Address, EnvelopeError> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    let bytes = hex::decode(digits).map_err(|e| EnvelopeError::InvalidHex(e.to_string()))?;
    let raw: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| EnvelopeError::InvalidLength(bytes.len()))?;
    Ok(Address::new(raw))
}

// ============ Conversions ============

impl From<&AssetTransfer> for TransferEnvelope {
    fn from(xfer: &AssetTransfer) -> Self {
        Self {
            asset: xfer.asset.0,
            amount: xfer.amount,
            sender: format_address(&xfer.sender),
            receiver: format_address(&xfer.receiver),
        }
    }
}

impl TryFrom<&TransferEnvelope> for AssetTransfer {
    type Error = EnvelopeError;

    fn try_from(env: &TransferEnvelope) -> Result<Self, Self::Error> {
        Ok(AssetTransfer {
            asset: AssetId(env.asset),
            amount: env.amount,
            sender: parse_address(&env.sender)?,
            receiver: parse_address(&env.receiver)?,
        })
    }
}

impl From<&Payment> for PaymentEnvelope {
    fn from(payment: &Payment) -> Self {
        Self {
            amount: payment.amount,
            sender: format_address(&payment.sender),
            receiver: format_address(&payment.receiver),
        }
    }
}

impl TryFrom<&PaymentEnvelope> for Payment {
    type Error = EnvelopeError;

    fn try_from(env: &PaymentEnvelope) -> Result<Self, Self::Error> {
        Ok(Payment {
            amount: env.amount,
            sender: parse_address(&env.sender)?,
            receiver: parse_address(&env.receiver)?,
        })
    }
}

impl From<&Call> for CallEnvelope {
    fn from(call: &Call) -> Self {
        match call {
            Call::Bootstrap { seed, asset_a, asset_b, max_fee } => CallEnvelope::Bootstrap {
                seed: seed.into(),
                asset_a: asset_a.0,
                asset_b: asset_b.0,
                max_fee: *max_fee,
            },
            Call::Mint { a_xfer, b_xfer, liquidity_token, asset_a, asset_b } => CallEnvelope::Mint {
                a_xfer: a_xfer.into(),
                b_xfer: b_xfer.into(),
                liquidity_token: liquidity_token.0,
                asset_a: asset_a.0,
                asset_b: asset_b.0,
            },
            Call::Burn { liquidity_xfer, liquidity_token, asset_a, asset_b } => CallEnvelope::Burn {
                liquidity_xfer: liquidity_xfer.into(),
                liquidity_token: liquidity_token.0,
                asset_a: asset_a.0,
                asset_b: asset_b.0,
            },
            Call::Swap { xfer, asset_a, asset_b } => CallEnvelope::Swap {
                xfer: xfer.into(),
                asset_a: asset_a.0,
                asset_b: asset_b.0,
            },
            Call::Bid { liquidity_token, rounds, bid_amount, window_start, bond } => {
                CallEnvelope::Bid {
                    liquidity_token: liquidity_token.0,
                    rounds: *rounds,
                    bid_amount: *bid_amount,
                    window_start: *window_start,
                    bond: bond.into(),
                }
            }
            Call::SetManager { candidate } => {
                CallEnvelope::SetManager { candidate: format_address(candidate) }
            }
            Call::SetNewFee { rate } => CallEnvelope::SetNewFee { rate: *rate },
            Call::ProvisionEscrow { payment } => {
                CallEnvelope::ProvisionEscrow { payment: payment.into() }
            }
        }
    }
}

impl TryFrom<&CallEnvelope> for Call {
    type Error = EnvelopeError;

    fn try_from(env: &CallEnvelope) -> Result<Self, Self::Error> {
        Ok(match env {
            CallEnvelope::Bootstrap { seed, asset_a, asset_b, max_fee } => Call::Bootstrap {
                seed: seed.try_into()?,
                asset_a: AssetId(*asset_a),
                asset_b: AssetId(*asset_b),
                max_fee: *max_fee,
            },
            CallEnvelope::Mint { a_xfer, b_xfer, liquidity_token, asset_a, asset_b } => Call::Mint {
                a_xfer: a_xfer.try_into()?,
                b_xfer: b_xfer.try_into()?,
                liquidity_token: AssetId(*liquidity_token),
                asset_a: AssetId(*asset_a),
                asset_b: AssetId(*asset_b),
            },
            CallEnvelope::Burn { liquidity_xfer, liquidity_token, asset_a, asset_b } => Call::Burn {
                liquidity_xfer: liquidity_xfer.try_into()?,
                liquidity_token: AssetId(*liquidity_token),
                asset_a: AssetId(*asset_a),
                asset_b: AssetId(*asset_b),
            },
            CallEnvelope::Swap { xfer, asset_a, asset_b } => Call::Swap {
                xfer: xfer.try_into()?,
                asset_a: AssetId(*asset_a),
                asset_b: AssetId(*asset_b),
            },
            CallEnvelope::Bid { liquidity_token, rounds, bid_amount, window_start, bond } => {
                Call::Bid {
                    liquidity_token: AssetId(*liquidity_token),
                    rounds: *rounds,
                    bid_amount: *bid_amount,
                    window_start: *window_start,
                    bond: bond.try_into()?,
                }
            }
            CallEnvelope::SetManager { candidate } => {
                Call::SetManager { candidate: parse_address(candidate)? }
            }
            CallEnvelope::SetNewFee { rate } => Call::SetNewFee { rate: *rate },
            CallEnvelope::ProvisionEscrow { payment } => {
                Call::ProvisionEscrow { payment: payment.try_into()? }
            }
        })
    }
}

// ============ Tests ============
