// ============ In-Memory Ledger ============
// A small host for running the contract off-chain: asset balances, native
// currency, opt-ins and the contract's persisted state. Calls are submitted as
// one group; the grouped transfers, the contract method and the instructions it
// returns either all apply or none do.

use std::collections::{BTreeMap, BTreeSet};

use au_amm_contract::{AmmContract, CallOutput, Host, HostError, Receipt, StateSnapshot};
use au_amm_types::{
    Address, AssetId, AssetParams, AssetTransfer, Call, CallContext, Instruction, Payment,
};
use sha2::{Digest, Sha256};

use crate::SdkError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetRecord {
    pub name: String,
    pub unit_name: String,
    pub total: u64,
    pub decimals: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryHost {
    app: Address,
    assets: BTreeMap<AssetId, AssetRecord>,
    balances: BTreeMap<(Address, AssetId), u64>,
    native: BTreeMap<Address, u64>,
    opt_ins: BTreeSet<(Address, AssetId)>,
    next_asset: u64,
    account_nonce: u64,
    persisted: Option<StateSnapshot>,
}

impl MemoryHost {
    pub fn new(app: Address) -> Self {
        Self {
            app,
            assets: BTreeMap::new(),
            balances: BTreeMap::new(),
            native: BTreeMap::new(),
            opt_ins: BTreeSet::new(),
            next_asset: 1,
            account_nonce: 0,
            persisted: None,
        }
    }

    /// Register an externally issued asset, fully held by `holder`.
    pub fn issue_asset(&mut self, unit_name: &str, total: u64, holder: Address) -> AssetId {
        let id = self.allocate_asset(AssetRecord {
            name: unit_name.to_string(),
            unit_name: unit_name.to_string(),
            total,
            decimals: 0,
        });
        self.opt_ins.insert((holder, id));
        self.balances.insert((holder, id), total);
        id
    }

    pub fn opt_in(&mut self, account: Address, asset: AssetId) -> Result<(), HostError> {
        if !self.assets.contains_key(&asset) {
            return Err(HostError::UnknownAsset(asset));
        }
        self.opt_ins.insert((account, asset));
        Ok(())
    }

    pub fn fund(&mut self, account: Address, amount: u64) -> Result<(), HostError> {
        let funded = self
            .native_balance(&account)
            .checked_add(amount)
            .ok_or(HostError::BalanceOverflow(account))?;
        self.native.insert(account, funded);
        Ok(())
    }

    pub fn balance(&self, account: &Address, asset: AssetId) -> u64 {
        self.balances.get(&(*account, asset)).copied().unwrap_or(0)
    }

    pub fn native_balance(&self, account: &Address) -> u64 {
        self.native.get(account).copied().unwrap_or(0)
    }

    pub fn is_opted_in(&self, account: &Address, asset: AssetId) -> bool {
        self.opt_ins.contains(&(*account, asset))
    }

    pub fn asset(&self, asset: AssetId) -> Option<&AssetRecord> {
        self.assets.get(&asset)
    }

    /// Contract state as of the last successful call.
    pub fn persisted(&self) -> Option<&StateSnapshot> {
        self.persisted.as_ref()
    }

    // ============ Submission ============

    /// Execute `call` from `ctx.caller` together with the transfers it carries.
    pub fn submit(
        &mut self,
        amm: &mut AmmContract,
        ctx: &CallContext,
        call: &Call,
    ) -> Result<Receipt<CallOutput>, SdkError> {
        let ledger_checkpoint = self.clone();
        let contract_checkpoint = amm.clone();

        let result = self.try_submit(amm, ctx, call);
        if result.is_err() {
            *self = ledger_checkpoint;
            *amm = contract_checkpoint;
        }
        result
    }

    fn try_submit(
        &mut self,
        amm: &mut AmmContract,
        ctx: &CallContext,
        call: &Call,
    ) -> Result<Receipt<CallOutput>, SdkError> {
        let (transfers, payment) = grouped_funds(call);
        for xfer in transfers {
            self.transfer_asset(xfer.asset, xfer.sender, xfer.receiver, xfer.amount)?;
        }
        if let Some(payment) = payment {
            self.transfer_native(payment.sender, payment.receiver, payment.amount)?;
        }

        let receipt = amm.dispatch(ctx, self, call)?;
        self.apply(&receipt.instructions)?;
        self.persisted = Some(amm.snapshot());
        Ok(receipt)
    }

    fn apply(&mut self, instructions: &[Instruction]) -> Result<(), HostError> {
        let app = self.app;
        for instruction in instructions {
            match *instruction {
                Instruction::Transfer { asset, receiver, amount } => {
                    self.transfer_asset(asset, app, receiver, amount)?
                }
                Instruction::Payment { receiver, amount } => {
                    self.transfer_native(app, receiver, amount)?
                }
                Instruction::OptIn { account, asset } => self.opt_in(account, asset)?,
            }
        }
        Ok(())
    }

    pub fn transfer_asset(
        &mut self,
        asset: AssetId,
        from: Address,
        to: Address,
        amount: u64,
    ) -> Result<(), HostError> {
        if !self.assets.contains_key(&asset) {
            return Err(HostError::UnknownAsset(asset));
        }
        if !self.is_opted_in(&to, asset) {
            return Err(HostError::NotOptedIn { account: to, asset });
        }
        let from_balance = self.balance(&from, asset);
        let remaining = from_balance
            .checked_sub(amount)
            .ok_or(HostError::InsufficientBalance { account: from, asset })?;

        if from == to {
            return Ok(());
        }
        let credited = self
            .balance(&to, asset)
            .checked_add(amount)
            .ok_or(HostError::BalanceOverflow(to))?;

        self.balances.insert((from, asset), remaining);
        self.balances.insert((to, asset), credited);
        Ok(())
    }

    pub fn transfer_native(
        &mut self,
        from: Address,
        to: Address,
        amount: u64,
    ) -> Result<(), HostError> {
        let remaining = self
            .native_balance(&from)
            .checked_sub(amount)
            .ok_or(HostError::InsufficientFunds(from))?;
        if from == to {
            return Ok(());
        }
        let credited = self
            .native_balance(&to)
            .checked_add(amount)
            .ok_or(HostError::BalanceOverflow(to))?;

        self.native.insert(from, remaining);
        self.native.insert(to, credited);
        Ok(())
    }

    fn allocate_asset(&mut self, record: AssetRecord) -> AssetId {
        let id = AssetId(self.next_asset);
        self.next_asset += 1;
        self.assets.insert(id, record);
        id
    }
}

impl Host for MemoryHost {
    fn app_address(&self) -> Address {
        self.app
    }

    fn asset_balance(&self, account: &Address, asset: AssetId) -> u64 {
        self.balance(account, asset)
    }

    fn unit_name(&self, asset: AssetId) -> Result<String, HostError> {
        self.assets
            .get(&asset)
            .map(|record| record.unit_name.clone())
            .ok_or(HostError::UnknownAsset(asset))
    }

    fn create_asset(&mut self, params: &AssetParams) -> Result<AssetId, HostError> {
        let id = self.allocate_asset(AssetRecord {
            name: params.name.clone(),
            unit_name: params.unit_name.clone(),
            total: params.total,
            decimals: params.decimals,
        });
        self.opt_ins.insert((params.reserve, id));
        self.balances.insert((params.reserve, id), params.total);
        Ok(id)
    }

    fn create_account(&mut self) -> Result<Address, HostError> {
        let address = derive_account(&self.app, self.account_nonce);
        self.account_nonce = self
            .account_nonce
            .checked_add(1)
            .ok_or(HostError::AccountCreationFailed)?;
        if self.native.contains_key(&address) {
            return Err(HostError::AccountCreationFailed);
        }
        self.native.insert(address, 0);
        Ok(address)
    }
}

// ============ Helpers ============

/// SHA-256(app || nonce) as a fresh account address.
pub fn derive_account(app: &Address, nonce: u64) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(app.as_bytes());
    hasher.update(nonce.to_le_bytes());
    Address::new(hasher.finalize().into())
}

/// Funds a call carries into the contract, credited before it runs.
pub fn grouped_funds(call: &Call) -> (Vec<AssetTransfer>, Option<Payment>) {
    match call {
        Call::Bootstrap { seed, .. } => (Vec::new(), Some(*seed)),
        Call::Mint { a_xfer, b_xfer, .. } => (vec![*a_xfer, *b_xfer], None),
        Call::Burn { liquidity_xfer, .. } => (vec![*liquidity_xfer], None),
        Call::Swap { xfer, .. } => (vec![*xfer], None),
        Call::Bid { bond, .. } => (vec![*bond], None),
        Call::ProvisionEscrow { payment } => (Vec::new(), Some(*payment)),
        Call::SetManager { .. } | Call::SetNewFee { .. } => (Vec::new(), None),
    }
}

// ============ Tests ============
