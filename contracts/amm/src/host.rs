// ============ Host Environment ============
// What the contract needs from the ledger it runs on. The host authenticates
// callers, credits grouped transfers before the call, executes the returned
// instructions and persists state; the contract only reads balances and asks
// for new assets or accounts.

use au_amm_types::{Address, AssetId, AssetParams};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("unknown asset {0}")]
    UnknownAsset(AssetId),
    #[error("account {account} is not opted into asset {asset}")]
    NotOptedIn { account: Address, asset: AssetId },
    #[error("account {account} holds too little of asset {asset}")]
    InsufficientBalance { account: Address, asset: AssetId },
    #[error("account {0} holds too little native currency")]
    InsufficientFunds(Address),
    #[error("crediting account {0} overflows its balance")]
    BalanceOverflow(Address),
    #[error("account creation failed")]
    AccountCreationFailed,
}

pub trait Host {
    /// The contract's own account.
    fn app_address(&self) -> Address;

    /// Current balance, including transfers grouped with the executing call.
    fn asset_balance(&self, account: &Address, asset: AssetId) -> u64;

    /// Short unit name of an asset, used to name the liquidity token.
    fn unit_name(&self, asset: AssetId) -> Result<String, HostError>;

    /// Create a fungible asset held entirely by `params.reserve`.
    fn create_asset(&mut self, params: &AssetParams) -> Result<AssetId, HostError>;

    /// Provision a new account whose signing authority is delegated to the contract.
    fn create_account(&mut self) -> Result<Address, HostError>;
}
