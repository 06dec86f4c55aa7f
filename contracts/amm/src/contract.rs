// ============ AU-AMM Contract ============
// Owns the pool, auction and escrow state and exposes every method.
//
// Each method runs against a draft copy of the state. The draft is committed
// only if the method returns Ok, together with the instructions in its
// Receipt, so a rejected call leaves no trace.

use au_amm_types::{
    Address, AssetId, AssetParams, AssetTransfer, AuctionState, Call, CallContext, ContractConfig,
    EscrowEntry, Instruction, Payment, PoolState, FEE_DENOMINATOR, LIQUIDITY_DECIMALS,
    LIQUIDITY_NAME_PREFIX, LIQUIDITY_UNIT_NAME, TOTAL_SUPPLY,
};
use tracing::{debug, info, warn};

use crate::auction::{self, BidRequest, Refund};
use crate::error::AmmError;
use crate::escrow::EscrowRegistry;
use crate::host::Host;
use crate::liquidity;
use crate::swap::{self, SwapQuote};

// ============ Receipts ============

/// Instructions for the host plus the method's return value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt<T> {
    pub instructions: Vec<Instruction>,
    pub output: T,
}

impl<T> Receipt<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Receipt<U> {
        Receipt { instructions: self.instructions, output: f(self.output) }
    }
}

#[derive(Default)]
struct Effects {
    instructions: Vec<Instruction>,
}

impl Effects {
    /// Zero-amount transfers are dropped.
    fn transfer(&mut self, asset: AssetId, receiver: Address, amount: u64) {
        if amount > 0 {
            self.instructions.push(Instruction::Transfer { asset, receiver, amount });
        }
    }

    fn payment(&mut self, receiver: Address, amount: u64) {
        self.instructions.push(Instruction::Payment { receiver, amount });
    }

    fn opt_in(&mut self, account: Address, asset: AssetId) {
        self.instructions.push(Instruction::OptIn { account, asset });
    }

    fn finish<T>(self, output: T) -> Receipt<T> {
        Receipt { instructions: self.instructions, output }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MintOutcome {
    pub minted: u64,
    /// The deposit funded an empty pool.
    pub initial: bool,
    /// The minted amount was transferred to the depositor.
    pub delivered: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BurnOutcome {
    pub amount_a: u64,
    pub amount_b: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapOutcome {
    pub asset_out: AssetId,
    pub quote: SwapQuote,
}

/// Return value of a routed call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallOutput {
    LiquidityToken(AssetId),
    Mint(MintOutcome),
    Burn(BurnOutcome),
    Swap(SwapOutcome),
    Bid(Option<Refund>),
    Escrow(Address),
    Unit,
}

// ============ State ============

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractState {
    /// Only identity allowed to bootstrap.
    pub creator: Address,
    pub pool: Option<PoolState>,
    pub auction: AuctionState,
    pub escrows: EscrowRegistry,
}

/// Persistable form of a contract, one byte record per entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateSnapshot {
    pub config: Vec<u8>,
    pub creator: [u8; 32],
    pub pool: Option<Vec<u8>>,
    pub auction: Vec<u8>,
    pub escrows: Vec<Vec<u8>>,
}

impl ContractState {
    pub fn new(creator: Address) -> Self {
        Self {
            creator,
            pool: None,
            auction: AuctionState::default(),
            escrows: EscrowRegistry::new(),
        }
    }

    pub fn pool(&self) -> Result<&PoolState, AmmError> {
        self.pool.as_ref().ok_or(AmmError::NotBootstrapped)
    }

    fn pool_mut(&mut self) -> Result<&mut PoolState, AmmError> {
        self.pool.as_mut().ok_or(AmmError::NotBootstrapped)
    }

    fn snapshot(&self, config: &ContractConfig) -> StateSnapshot {
        StateSnapshot {
            config: config.serialize().to_vec(),
            creator: self.creator.0,
            pool: self.pool.as_ref().map(|pool| pool.serialize().to_vec()),
            auction: self.auction.serialize().to_vec(),
            escrows: self.escrows.entries().map(|entry| entry.serialize().to_vec()).collect(),
        }
    }

    /// Rebuild state from persisted records. `None` if any record is malformed.
    fn restore(snapshot: &StateSnapshot) -> Option<Self> {
        let pool = match &snapshot.pool {
            Some(bytes) => Some(PoolState::deserialize(bytes)?),
            None => None,
        };
        let escrows = snapshot
            .escrows
            .iter()
            .map(|bytes| EscrowEntry::deserialize(bytes))
            .collect::<Option<EscrowRegistry>>()?;

        Some(Self {
            creator: Address(snapshot.creator),
            pool,
            auction: AuctionState::deserialize(&snapshot.auction)?,
            escrows,
        })
    }
}

// ============ Contract ============

#[derive(Clone, Debug)]
pub struct AmmContract {
    config: ContractConfig,
    state: ContractState,
}

impl AmmContract {
    /// Application creation: records the creator, nothing else is live until bootstrap.
    pub fn create(creator: Address, config: ContractConfig) -> Result<Self, AmmError> {
        Self::restore(config, ContractState::new(creator))
    }

    pub fn restore(config: ContractConfig, state: ContractState) -> Result<Self, AmmError> {
        config.validate()?;
        Ok(Self { config, state })
    }

    /// Rebuild a contract, configuration included, from its persisted records.
    pub fn from_snapshot(snapshot: &StateSnapshot) -> Result<Self, AmmError> {
        let config =
            ContractConfig::deserialize(&snapshot.config).ok_or(AmmError::MalformedSnapshot)?;
        let state = ContractState::restore(snapshot).ok_or(AmmError::MalformedSnapshot)?;
        Self::restore(config, state)
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.state.snapshot(&self.config)
    }

    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    pub fn state(&self) -> &ContractState {
        &self.state
    }

    pub fn pool(&self) -> Option<&PoolState> {
        self.state.pool.as_ref()
    }

    pub fn auction(&self) -> &AuctionState {
        &self.state.auction
    }

    pub fn escrows(&self) -> &EscrowRegistry {
        &self.state.escrows
    }

    fn execute<T>(
        &mut self,
        op: impl FnOnce(&ContractConfig, &mut ContractState) -> Result<Receipt<T>, AmmError>,
    ) -> Result<Receipt<T>, AmmError> {
        let mut draft = self.state.clone();
        let receipt = op(&self.config, &mut draft)?;
        self.state = draft;
        Ok(receipt)
    }

    // ============ Routing ============

    pub fn dispatch<H: Host + ?Sized>(
        &mut self,
        ctx: &CallContext,
        host: &mut H,
        call: &Call,
    ) -> Result<Receipt<CallOutput>, AmmError> {
        let result = match call {
            Call::Bootstrap { seed, asset_a, asset_b, max_fee } => self
                .bootstrap(ctx, host, seed, *asset_a, *asset_b, *max_fee)
                .map(|r| r.map(CallOutput::LiquidityToken)),
            Call::Mint { a_xfer, b_xfer, liquidity_token, asset_a, asset_b } => self
                .mint(ctx, &*host, a_xfer, b_xfer, *liquidity_token, *asset_a, *asset_b)
                .map(|r| r.map(CallOutput::Mint)),
            Call::Burn { liquidity_xfer, liquidity_token, asset_a, asset_b } => self
                .burn(ctx, &*host, liquidity_xfer, *liquidity_token, *asset_a, *asset_b)
                .map(|r| r.map(CallOutput::Burn)),
            Call::Swap { xfer, asset_a, asset_b } => self
                .swap(ctx, &*host, xfer, *asset_a, *asset_b)
                .map(|r| r.map(CallOutput::Swap)),
            Call::Bid { liquidity_token, rounds, bid_amount, window_start, bond } => self
                .bid(ctx, &*host, *liquidity_token, *rounds, *bid_amount, *window_start, bond)
                .map(|r| r.map(CallOutput::Bid)),
            Call::SetManager { candidate } => {
                self.set_manager(ctx, *candidate).map(|r| r.map(|_| CallOutput::Unit))
            }
            Call::SetNewFee { rate } => {
                self.set_new_fee(ctx, *rate).map(|r| r.map(|_| CallOutput::Unit))
            }
            Call::ProvisionEscrow { payment } => self
                .provision_escrow(ctx, host, payment)
                .map(|r| r.map(CallOutput::Escrow)),
        };

        if let Err(err) = &result {
            warn!(method = call.method_name(), caller = ?ctx.caller, error = %err, "call rejected");
        }
        result
    }

    // ============ Bootstrap ============

    /// Create the liquidity token and fix the reserve pair and fee ceiling.
    pub fn bootstrap<H: Host + ?Sized>(
        &mut self,
        ctx: &CallContext,
        host: &mut H,
        seed: &Payment,
        asset_a: AssetId,
        asset_b: AssetId,
        max_fee: u64,
    ) -> Result<Receipt<AssetId>, AmmError> {
        self.execute(|config, state| {
            if ctx.caller != state.creator {
                return Err(AmmError::NotCreator);
            }
            if state.pool.is_some() {
                return Err(AmmError::AlreadyBootstrapped);
            }

            let app = host.app_address();
            verify_payment(seed, &app)?;
            if seed.amount < config.bootstrap_seed_min {
                return Err(AmmError::InsufficientSeed);
            }

            if asset_a >= asset_b {
                return Err(AmmError::UnorderedAssets);
            }
            if max_fee < config.default_fee_rate || max_fee > FEE_DENOMINATOR {
                return Err(AmmError::InvalidFeeCeiling(max_fee));
            }

            let params = liquidity_token_params(&*host, app, asset_a, asset_b)?;
            let liquidity_token = host.create_asset(&params)?;

            state.pool = Some(PoolState {
                asset_a,
                asset_b,
                liquidity_token,
                current_fee: config.default_fee_rate,
                max_fee,
                fee_recipient: state.creator,
                last_ratio: 0,
            });

            let mut effects = Effects::default();
            effects.opt_in(app, asset_a);
            effects.opt_in(app, asset_b);

            info!(
                %asset_a,
                %asset_b,
                %liquidity_token,
                max_fee,
                name = %params.name,
                "pool bootstrapped"
            );
            Ok(effects.finish(liquidity_token))
        })
    }

    // ============ Liquidity ============

    /// Deposit both reserves and receive liquidity tokens.
    pub fn mint<H: Host + ?Sized>(
        &mut self,
        ctx: &CallContext,
        host: &H,
        a_xfer: &AssetTransfer,
        b_xfer: &AssetTransfer,
        liquidity_token: AssetId,
        asset_a: AssetId,
        asset_b: AssetId,
    ) -> Result<Receipt<MintOutcome>, AmmError> {
        self.execute(|config, state| {
            let pool = state.pool()?;
            check_pair(pool, asset_a, asset_b)?;
            check_liquidity_token(pool, liquidity_token)?;

            let app = host.app_address();
            verify_transfer(a_xfer, &ctx.caller, &app, asset_a)?;
            verify_transfer(b_xfer, &ctx.caller, &app, asset_b)?;

            let balance_a = host.asset_balance(&app, asset_a);
            let balance_b = host.asset_balance(&app, asset_b);
            let mut effects = Effects::default();

            if balance_a == a_xfer.amount && balance_b == b_xfer.amount {
                let minted = liquidity::initial_mint(a_xfer.amount, b_xfer.amount);
                let delivered = config.deliver_initial_mint;
                if delivered {
                    effects.transfer(liquidity_token, ctx.caller, minted);
                }

                debug!(minted, delivered, "initial mint");
                return Ok(effects.finish(MintOutcome { minted, initial: true, delivered }));
            }

            let issued = liquidity::issued_supply(host.asset_balance(&app, liquidity_token))?;
            let prior_a = balance_a.checked_sub(a_xfer.amount).ok_or(AmmError::BalanceUnderflow)?;
            let prior_b = balance_b.checked_sub(b_xfer.amount).ok_or(AmmError::BalanceUnderflow)?;

            let minted =
                liquidity::tokens_to_mint(issued, prior_a, prior_b, a_xfer.amount, b_xfer.amount)?;
            if minted == 0 {
                return Err(AmmError::NothingToMint);
            }
            effects.transfer(liquidity_token, ctx.caller, minted);

            debug!(minted, issued, prior_a, prior_b, "mint");
            Ok(effects.finish(MintOutcome { minted, initial: false, delivered: true }))
        })
    }

    /// Redeem liquidity tokens for a pro-rata share of both reserves.
    pub fn burn<H: Host + ?Sized>(
        &mut self,
        ctx: &CallContext,
        host: &H,
        liquidity_xfer: &AssetTransfer,
        liquidity_token: AssetId,
        asset_a: AssetId,
        asset_b: AssetId,
    ) -> Result<Receipt<BurnOutcome>, AmmError> {
        self.execute(|_, state| {
            let pool = state.pool_mut()?;
            check_liquidity_token(pool, liquidity_token)?;
            check_pair(pool, asset_a, asset_b)?;

            let app = host.app_address();
            verify_transfer(liquidity_xfer, &ctx.caller, &app, liquidity_token)?;

            let redeemed = liquidity_xfer.amount;
            let held_before = host
                .asset_balance(&app, liquidity_token)
                .checked_sub(redeemed)
                .ok_or(AmmError::BalanceUnderflow)?;
            let issued = liquidity::issued_supply(held_before)?;

            let reserve_a = host.asset_balance(&app, asset_a);
            let reserve_b = host.asset_balance(&app, asset_b);
            let amount_a = liquidity::tokens_to_burn(issued, reserve_a, redeemed)?;
            let amount_b = liquidity::tokens_to_burn(issued, reserve_b, redeemed)?;

            let mut effects = Effects::default();
            effects.transfer(asset_a, ctx.caller, amount_a);
            effects.transfer(asset_b, ctx.caller, amount_b);

            pool.last_ratio = liquidity::price_ratio(
                reserve_a.checked_sub(amount_a).ok_or(AmmError::BalanceUnderflow)?,
                reserve_b.checked_sub(amount_b).ok_or(AmmError::BalanceUnderflow)?,
            )?;

            debug!(redeemed, issued, amount_a, amount_b, ratio = pool.last_ratio, "burn");
            Ok(effects.finish(BurnOutcome { amount_a, amount_b }))
        })
    }

    // ============ Swap ============

    /// Exchange one reserve for the other; the fee goes to the fee recipient.
    pub fn swap<H: Host + ?Sized>(
        &mut self,
        ctx: &CallContext,
        host: &H,
        xfer: &AssetTransfer,
        asset_a: AssetId,
        asset_b: AssetId,
    ) -> Result<Receipt<SwapOutcome>, AmmError> {
        self.execute(|_, state| {
            let ContractState { pool, escrows, .. } = state;
            let pool = pool.as_mut().ok_or(AmmError::NotBootstrapped)?;
            check_pair(pool, asset_a, asset_b)?;

            let app = host.app_address();
            let asset_in = xfer.asset;
            let asset_out = pool.counter_asset(asset_in).ok_or(AmmError::WrongAsset(asset_in))?;
            verify_transfer(xfer, &ctx.caller, &app, asset_in)?;

            let balance_in = host.asset_balance(&app, asset_in);
            let reserve_in = balance_in.checked_sub(xfer.amount).ok_or(AmmError::BalanceUnderflow)?;
            let reserve_out = host.asset_balance(&app, asset_out);

            let quote = swap::quote_swap(xfer.amount, pool.current_fee, reserve_in, reserve_out)?;

            let fee_target = escrows.payout_target(&pool.fee_recipient);
            let mut effects = Effects::default();
            effects.transfer(asset_out, ctx.caller, quote.amount_out);
            effects.transfer(asset_in, fee_target, quote.fee);

            let after_in = balance_in.checked_sub(quote.fee).ok_or(AmmError::BalanceUnderflow)?;
            let after_out = reserve_out
                .checked_sub(quote.amount_out)
                .ok_or(AmmError::BalanceUnderflow)?;
            let (after_a, after_b) = if asset_in == pool.asset_a {
                (after_in, after_out)
            } else {
                (after_out, after_in)
            };
            pool.last_ratio = liquidity::price_ratio(after_a, after_b)?;

            debug!(
                %asset_in,
                amount_in = xfer.amount,
                fee = quote.fee,
                amount_out = quote.amount_out,
                fee_target = ?fee_target,
                ratio = pool.last_ratio,
                "swap"
            );
            Ok(effects.finish(SwapOutcome { asset_out, quote }))
        })
    }

    // ============ Auction ============

    /// Bid for the fee-recipient slot over `[window_start, window_start + rounds)`,
    /// bonding liquidity tokens to cover the whole bid.
    pub fn bid<H: Host + ?Sized>(
        &mut self,
        ctx: &CallContext,
        host: &H,
        liquidity_token: AssetId,
        rounds: u64,
        bid_amount: u64,
        window_start: u64,
        bond: &AssetTransfer,
    ) -> Result<Receipt<Option<Refund>>, AmmError> {
        self.execute(|config, state| {
            let pool = state.pool()?;

            let earliest =
                ctx.now.checked_add(config.min_lead_time).ok_or(AmmError::WindowTooSoon)?;
            if earliest >= window_start {
                return Err(AmmError::WindowTooSoon);
            }
            if rounds <= config.min_rounds {
                return Err(AmmError::TooFewRounds);
            }
            if bid_amount == 0 {
                return Err(AmmError::ZeroBid);
            }
            check_liquidity_token(pool, liquidity_token)?;

            let app = host.app_address();
            verify_transfer(bond, &ctx.caller, &app, pool.liquidity_token)?;

            let required = bid_amount.checked_mul(rounds).ok_or(AmmError::BondOverflow)?;
            if bond.amount < required {
                return Err(AmmError::InsufficientBond { bonded: bond.amount, required });
            }

            let request = BidRequest {
                bidder: ctx.caller,
                window_start,
                rounds,
                bid_amount,
                deposit: bond.amount,
            };
            let resolution = auction::resolve_bid(&state.auction, &request, ctx.now)?
                .ok_or(AmmError::BidNotWinning)?;

            let mut effects = Effects::default();
            if let Some(refund) = &resolution.refund {
                effects.transfer(liquidity_token, refund.recipient, refund.amount);
            }

            debug!(
                bidder = ?ctx.caller,
                window_start,
                window_end = resolution.state.window_end,
                bid_amount,
                refund = ?resolution.refund,
                "bid accepted"
            );
            state.auction = resolution.state;
            Ok(effects.finish(resolution.refund))
        })
    }

    /// Hand the fee-recipient role to the winning bidder once its window has opened.
    pub fn set_manager(
        &mut self,
        ctx: &CallContext,
        candidate: Address,
    ) -> Result<Receipt<()>, AmmError> {
        self.execute(|_, state| {
            auction::check_manager_claim(&state.auction, &candidate, ctx.now)?;
            let pool = state.pool_mut()?;
            pool.fee_recipient = candidate;

            info!(manager = ?candidate, "fee recipient replaced by auction winner");
            Ok(Effects::default().finish(()))
        })
    }

    // ============ Governance ============

    pub fn set_new_fee(&mut self, ctx: &CallContext, rate: u64) -> Result<Receipt<()>, AmmError> {
        self.execute(|_, state| {
            let pool = state.pool_mut()?;
            if ctx.caller != pool.fee_recipient {
                return Err(AmmError::NotFeeRecipient);
            }
            if rate > pool.max_fee {
                return Err(AmmError::FeeAboveCeiling { rate, max: pool.max_fee });
            }
            pool.current_fee = rate;

            info!(rate, "fee rate updated");
            Ok(Effects::default().finish(()))
        })
    }

    // ============ Escrow ============

    /// Provision a delegated account for the caller and register it as their payout target.
    pub fn provision_escrow<H: Host + ?Sized>(
        &mut self,
        ctx: &CallContext,
        host: &mut H,
        payment: &Payment,
    ) -> Result<Receipt<Address>, AmmError> {
        self.execute(|config, state| {
            let app = host.app_address();
            verify_payment(payment, &app)?;
            if payment.amount <= config.escrow_fee_min {
                return Err(AmmError::InsufficientEscrowFee);
            }
            let pool = state.pool()?.clone();

            let delegate = host.create_account()?;

            let mut effects = Effects::default();
            effects.payment(delegate, config.escrow_funding);
            effects.opt_in(delegate, pool.liquidity_token);
            effects.opt_in(delegate, pool.asset_a);
            effects.opt_in(delegate, pool.asset_b);

            state.escrows.register(ctx.caller, delegate);

            info!(requester = ?ctx.caller, delegate = ?delegate, "escrow provisioned");
            Ok(effects.finish(delegate))
        })
    }
}

// ============ Helpers ============

/// Liquidity-token parameters for a pool over `asset_a`/`asset_b`.
pub fn liquidity_token_params<H: Host + ?Sized>(
    host: &H,
    app: Address,
    asset_a: AssetId,
    asset_b: AssetId,
) -> Result<AssetParams, AmmError> {
    let name = format!(
        "{}-{}-{}",
        LIQUIDITY_NAME_PREFIX,
        host.unit_name(asset_a)?,
        host.unit_name(asset_b)?
    );

    Ok(AssetParams {
        name,
        unit_name: LIQUIDITY_UNIT_NAME.to_string(),
        total: TOTAL_SUPPLY,
        decimals: LIQUIDITY_DECIMALS,
        manager: app,
        reserve: app,
    })
}

fn verify_transfer(
    xfer: &AssetTransfer,
    caller: &Address,
    app: &Address,
    asset: AssetId,
) -> Result<(), AmmError> {
    if xfer.sender != *caller {
        return Err(AmmError::TransferSenderMismatch);
    }
    if xfer.amount == 0 {
        return Err(AmmError::ZeroTransfer);
    }
    if xfer.receiver != *app {
        return Err(AmmError::TransferReceiverMismatch);
    }
    if xfer.asset != asset {
        return Err(AmmError::WrongAsset(xfer.asset));
    }
    Ok(())
}

fn verify_payment(payment: &Payment, app: &Address) -> Result<(), AmmError> {
    if payment.receiver != *app {
        return Err(AmmError::PaymentReceiverMismatch);
    }
    Ok(())
}

fn check_pair(pool: &PoolState, asset_a: AssetId, asset_b: AssetId) -> Result<(), AmmError> {
    if asset_a != pool.asset_a {
        return Err(AmmError::WrongAsset(asset_a));
    }
    if asset_b != pool.asset_b {
        return Err(AmmError::WrongAsset(asset_b));
    }
    Ok(())
}

fn check_liquidity_token(pool: &PoolState, liquidity_token: AssetId) -> Result<(), AmmError> {
    if liquidity_token != pool.liquidity_token {
        return Err(AmmError::WrongAsset(liquidity_token));
    }
    Ok(())
}

// ============ Tests ============
