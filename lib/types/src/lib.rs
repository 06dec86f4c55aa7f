// ============ AU-AMM Types ============
// Shared record definitions for the pool contract, SDK and test suite.
// Persisted records use fixed little-endian layouts so the host can store
// them as opaque key-value entries.

use core::fmt;
use thiserror::Error;

// ============ Liquidity Token Constants ============

/// Fixed issuance of the liquidity token; all of it starts in the pool's own account.
pub const TOTAL_SUPPLY: u64 = 10_000_000_000_000_000; // 10^16
pub const LIQUIDITY_DECIMALS: u32 = 3;
pub const LIQUIDITY_UNIT_NAME: &str = "vlp";
pub const LIQUIDITY_NAME_PREFIX: &str = "VLP";

// ============ Fee Constants ============

/// Fee rates are expressed per mille of the input amount.
pub const FEE_DENOMINATOR: u64 = 1_000;
pub const DEFAULT_FEE_RATE: u64 = 5; // 0.5%

// ============ Default Config ============

pub const DEFAULT_MIN_LEAD_TIME: u64 = 10;
pub const DEFAULT_MIN_ROUNDS: u64 = 10;
pub const DEFAULT_BOOTSTRAP_SEED_MIN: u64 = 300_000;
pub const DEFAULT_ESCROW_FEE_MIN: u64 = 400_000;
pub const DEFAULT_ESCROW_FUNDING: u64 = 300_000;

// ============ Identities ============

/// 32-byte account identity.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub const ZERO: Address = Address([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First four bytes are enough to tell accounts apart in logs
        write!(f, "Address({:02x}{:02x}{:02x}{:02x}..)", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

/// Fungible asset identifier. Ordering is the canonical pair ordering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetId(pub u64);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============ Call Inputs ============

/// Per-call facts supplied by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub now: u64,
}

/// A verified incoming asset transfer grouped with the call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssetTransfer {
    pub asset: AssetId,
    pub amount: u64,
    pub sender: Address,
    pub receiver: Address,
}

/// A verified incoming native-currency payment grouped with the call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payment {
    pub amount: u64,
    pub sender: Address,
    pub receiver: Address,
}

/// Parameters for the liquidity token the pool creates at bootstrap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetParams {
    pub name: String,
    pub unit_name: String,
    pub total: u64,
    pub decimals: u32,
    pub manager: Address,
    pub reserve: Address,
}

// ============ Call Outputs ============

/// Outgoing effect requested by a call, executed by the host atomically with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Move `amount` of `asset` from the contract account to `receiver`.
    Transfer { asset: AssetId, receiver: Address, amount: u64 },
    /// Send native currency from the contract account.
    Payment { receiver: Address, amount: u64 },
    /// Zero-amount self transfer that lets `account` hold `asset`.
    OptIn { account: Address, asset: AssetId },
}

/// Every method the contract exposes, with its grouped transfers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Bootstrap {
        seed: Payment,
        asset_a: AssetId,
        asset_b: AssetId,
        max_fee: u64,
    },
    Mint {
        a_xfer: AssetTransfer,
        b_xfer: AssetTransfer,
        liquidity_token: AssetId,
        asset_a: AssetId,
        asset_b: AssetId,
    },
    Burn {
        liquidity_xfer: AssetTransfer,
        liquidity_token: AssetId,
        asset_a: AssetId,
        asset_b: AssetId,
    },
    Swap {
        xfer: AssetTransfer,
        asset_a: AssetId,
        asset_b: AssetId,
    },
    Bid {
        liquidity_token: AssetId,
        rounds: u64,
        bid_amount: u64,
        window_start: u64,
        bond: AssetTransfer,
    },
    SetManager {
        candidate: Address,
    },
    SetNewFee {
        rate: u64,
    },
    ProvisionEscrow {
        payment: Payment,
    },
}

impl Call {
    pub fn method_name(&self) -> &'static str {
        match self {
            Call::Bootstrap { .. } => "bootstrap",
            Call::Mint { .. } => "mint",
            Call::Burn { .. } => "burn",
            Call::Swap { .. } => "swap",
            Call::Bid { .. } => "bid",
            Call::SetManager { .. } => "set_manager",
            Call::SetNewFee { .. } => "set_new_fee",
            Call::ProvisionEscrow { .. } => "provision_escrow",
        }
    }
}

// ============ Persisted State ============

/// Pool singleton, present once the contract has been bootstrapped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolState {
    pub asset_a: AssetId,
    pub asset_b: AssetId,
    pub liquidity_token: AssetId,
    pub current_fee: u64,
    pub max_fee: u64,
    pub fee_recipient: Address,
    /// Reserve A per reserve B, scaled by 1000.
    pub last_ratio: u64,
}

impl PoolState {
    pub const SERIALIZED_SIZE: usize = 8 + 8 + 8 + 8 + 8 + 32 + 8; // 80

    pub fn is_reserve(&self, asset: AssetId) -> bool {
        asset == self.asset_a || asset == self.asset_b
    }

    /// The reserve on the other side of `asset`.
    pub fn counter_asset(&self, asset: AssetId) -> Option<AssetId> {
        if asset == self.asset_a {
            Some(self.asset_b)
        } else if asset == self.asset_b {
            Some(self.asset_a)
        } else {
            None
        }
    }

    pub fn serialize(&self) -> [u8; Self::SERIALIZED_SIZE] {
        let mut buf = [0u8; Self::SERIALIZED_SIZE];
        let mut offset = 0;

        buf[offset..offset + 8].copy_from_slice(&self.asset_a.0.to_le_bytes());
        offset += 8;
        buf[offset..offset + 8].copy_from_slice(&self.asset_b.0.to_le_bytes());
        offset += 8;
        buf[offset..offset + 8].copy_from_slice(&self.liquidity_token.0.to_le_bytes());
        offset += 8;
        buf[offset..offset + 8].copy_from_slice(&self.current_fee.to_le_bytes());
        offset += 8;
        buf[offset..offset + 8].copy_from_slice(&self.max_fee.to_le_bytes());
        offset += 8;
        buf[offset..offset + 32].copy_from_slice(&self.fee_recipient.0);
        offset += 32;
        buf[offset..offset + 8].copy_from_slice(&self.last_ratio.to_le_bytes());

        buf
    }

    pub fn deserialize(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SERIALIZED_SIZE {
            return None;
        }
        let mut offset = 0;
        let mut result = Self::default();

        result.asset_a = AssetId(u64::from_le_bytes(data[offset..offset + 8].try_into().ok()?));
        offset += 8;
        result.asset_b = AssetId(u64::from_le_bytes(data[offset..offset + 8].try_into().ok()?));
        offset += 8;
        result.liquidity_token =
            AssetId(u64::from_le_bytes(data[offset..offset + 8].try_into().ok()?));
        offset += 8;
        result.current_fee = u64::from_le_bytes(data[offset..offset + 8].try_into().ok()?);
        offset += 8;
        result.max_fee = u64::from_le_bytes(data[offset..offset + 8].try_into().ok()?);
        offset += 8;
        result.fee_recipient.0.copy_from_slice(&data[offset..offset + 32]);
        offset += 32;
        result.last_ratio = u64::from_le_bytes(data[offset..offset + 8].try_into().ok()?);

        Some(result)
    }
}

/// The single winning bid for the fee-recipient slot over `[window_start, window_end)`.
/// All-zero until the first bid lands.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuctionState {
    pub window_start: u64,
    pub window_end: u64,
    pub bidder: Address,
    pub bid_amount: u64,
    pub bonded_deposit: u64,
}

impl AuctionState {
    pub const SERIALIZED_SIZE: usize = 8 + 8 + 32 + 8 + 8; // 64

    /// Whether the recorded window has concluded at `now`.
    pub fn is_expired(&self, now: u64) -> bool {
        self.window_end < now
    }

    pub fn serialize(&self) -> [u8; Self::SERIALIZED_SIZE] {
        let mut buf = [0u8; Self::SERIALIZED_SIZE];
        buf[0..8].copy_from_slice(&self.window_start.to_le_bytes());
        buf[8..16].copy_from_slice(&self.window_end.to_le_bytes());
        buf[16..48].copy_from_slice(&self.bidder.0);
        buf[48..56].copy_from_slice(&self.bid_amount.to_le_bytes());
        buf[56..64].copy_from_slice(&self.bonded_deposit.to_le_bytes());
        buf
    }

    pub fn deserialize(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SERIALIZED_SIZE {
            return None;
        }
        Some(Self {
            window_start: u64::from_le_bytes(data[0..8].try_into().ok()?),
            window_end: u64::from_le_bytes(data[8..16].try_into().ok()?),
            bidder: Address(data[16..48].try_into().ok()?),
            bid_amount: u64::from_le_bytes(data[48..56].try_into().ok()?),
            bonded_deposit: u64::from_le_bytes(data[56..64].try_into().ok()?),
        })
    }
}

/// One row of the escrow registry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EscrowEntry {
    pub requester: Address,
    pub delegate: Address,
}

impl EscrowEntry {
    pub const SERIALIZED_SIZE: usize = 32 + 32; // 64

    pub fn serialize(&self) -> [u8; Self::SERIALIZED_SIZE] {
        let mut buf = [0u8; Self::SERIALIZED_SIZE];
        buf[0..32].copy_from_slice(&self.requester.0);
        buf[32..64].copy_from_slice(&self.delegate.0);
        buf
    }

    pub fn deserialize(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SERIALIZED_SIZE {
            return None;
        }
        Some(Self {
            requester: Address(data[0..32].try_into().ok()?),
            delegate: Address(data[32..64].try_into().ok()?),
        })
    }
}

// ============ Contract Configuration ============

/// Tunables fixed when the contract is created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractConfig {
    /// Fee rate the pool starts with at bootstrap.
    pub default_fee_rate: u64,
    /// A bid's window must open strictly more than this many time units ahead.
    pub min_lead_time: u64,
    /// A bid must cover strictly more rounds than this.
    pub min_rounds: u64,
    pub bootstrap_seed_min: u64,
    /// Escrow provisioning payments must be strictly above this.
    pub escrow_fee_min: u64,
    /// Native balance each new escrow account is funded with.
    pub escrow_funding: u64,
    /// Transfer the initial mint to the depositor instead of leaving it in the pool.
    pub deliver_initial_mint: bool,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            default_fee_rate: DEFAULT_FEE_RATE,
            min_lead_time: DEFAULT_MIN_LEAD_TIME,
            min_rounds: DEFAULT_MIN_ROUNDS,
            bootstrap_seed_min: DEFAULT_BOOTSTRAP_SEED_MIN,
            escrow_fee_min: DEFAULT_ESCROW_FEE_MIN,
            escrow_funding: DEFAULT_ESCROW_FUNDING,
            deliver_initial_mint: false,
        }
    }
}

impl ContractConfig {
    pub const SERIALIZED_SIZE: usize = 8 * 6 + 1; // 49

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_fee_rate > FEE_DENOMINATOR {
            return Err(ConfigError::InvalidFeeRate);
        }
        if self.bootstrap_seed_min == 0 {
            return Err(ConfigError::InvalidBootstrapSeed);
        }
        // The provisioning fee has to cover the funding the contract sends out
        if self.escrow_funding == 0 || self.escrow_funding > self.escrow_fee_min {
            return Err(ConfigError::InvalidEscrowFunding);
        }
        if self.min_lead_time.checked_add(self.min_rounds).is_none() {
            return Err(ConfigError::InvalidAuctionTiming);
        }
        Ok(())
    }

    pub fn serialize(&self) -> [u8; Self::SERIALIZED_SIZE] {
        let mut buf = [0u8; Self::SERIALIZED_SIZE];
        let mut offset = 0;

        for value in [
            self.default_fee_rate,
            self.min_lead_time,
            self.min_rounds,
            self.bootstrap_seed_min,
            self.escrow_fee_min,
            self.escrow_funding,
        ] {
            buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
            offset += 8;
        }
        buf[offset] = self.deliver_initial_mint as u8;

        buf
    }

    pub fn deserialize(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SERIALIZED_SIZE {
            return None;
        }
        let word = |i: usize| -> Option<u64> {
            Some(u64::from_le_bytes(data[i * 8..i * 8 + 8].try_into().ok()?))
        };

        Some(Self {
            default_fee_rate: word(0)?,
            min_lead_time: word(1)?,
            min_rounds: word(2)?,
            bootstrap_seed_min: word(3)?,
            escrow_fee_min: word(4)?,
            escrow_funding: word(5)?,
            deliver_initial_mint: data[48] != 0,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("default fee rate exceeds the fee denominator")]
    InvalidFeeRate,
    #[error("bootstrap seed minimum must be positive")]
    InvalidBootstrapSeed,
    #[error("escrow funding must be positive and covered by the provisioning fee")]
    InvalidEscrowFunding,
    #[error("auction lead time and minimum rounds overflow")]
    InvalidAuctionTiming,
}

// ============ Tests ============
