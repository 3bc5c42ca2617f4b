//! Ledger state
//!
//! Balances, allowances, pool reserves and used nonces. All mutations go
//! through `set_*` helpers that write the overwritten value to the journal.

use alloy::primitives::{Address, B256, U256};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

use super::journal::{Checkpoint, Journal, JournalEntry};
use crate::errors::{AuthFailure, RouterError};
use crate::types::Asset;
use crate::venues::Pair;

const K_SCALE: u64 = 1_000_000;

#[derive(Debug, Clone)]
pub struct Ledger {
    balances: HashMap<(Asset, Address), U256>,
    /// (token, owner, spender) -> remaining allowance; `U256::MAX` never decrements
    allowances: HashMap<(Address, Address, Address), U256>,
    pairs: HashMap<Address, Pair>,
    used_nonces: HashSet<(Address, B256)>,
    wrapped_native: Address,
    journal: Journal,
}

impl Ledger {
    pub fn new(wrapped_native: Address) -> Self {
        Self {
            balances: HashMap::new(),
            allowances: HashMap::new(),
            pairs: HashMap::new(),
            used_nonces: HashSet::new(),
            wrapped_native,
            journal: Journal::default(),
        }
    }

    pub fn wrapped_native(&self) -> Address {
        self.wrapped_native
    }

    // ── Journal ──────────────────────────────────────────────────────

    pub fn checkpoint(&mut self) -> Checkpoint {
        let checkpoint = self.journal.open();
        trace!(position = checkpoint.0, "ledger checkpoint");
        checkpoint
    }

    /// Undo every mutation made since `checkpoint`
    pub fn revert_to(&mut self, checkpoint: Checkpoint) {
        let undone = self.journal.unwind(checkpoint);
        trace!(position = checkpoint.0, entries = undone.len(), "ledger revert");

        for entry in undone {
            match entry {
                JournalEntry::Balance { asset, account, previous } => {
                    write_or_remove(&mut self.balances, (asset, account), previous);
                }
                JournalEntry::Allowance { token, owner, spender, previous } => {
                    write_or_remove(&mut self.allowances, (token, owner, spender), previous);
                }
                JournalEntry::Nonce { signer, key } => {
                    self.used_nonces.remove(&(signer, key));
                }
                JournalEntry::Reserves { pair, reserve0, reserve1 } => {
                    if let Some(state) = self.pairs.get_mut(&pair) {
                        state.reserve0 = reserve0;
                        state.reserve1 = reserve1;
                    }
                }
                JournalEntry::PairAdded { pair } => {
                    self.pairs.remove(&pair);
                }
            }
        }
    }

    /// Keep every mutation made since `checkpoint`
    pub fn commit(&mut self, checkpoint: Checkpoint) {
        trace!(position = checkpoint.0, "ledger commit");
        self.journal.close();
    }

    // ── Balances ─────────────────────────────────────────────────────

    pub fn balance_of(&self, asset: Asset, account: Address) -> U256 {
        self.balances
            .get(&(asset, account))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    /// Every non-zero balance, for snapshots and reports
    pub fn balances(&self) -> &HashMap<(Asset, Address), U256> {
        &self.balances
    }

    /// Create `amount` of `asset` out of thin air (seeding only)
    pub fn mint(&mut self, asset: Asset, account: Address, amount: U256) -> Result<(), RouterError> {
        let balance = self
            .balance_of(asset, account)
            .checked_add(amount)
            .ok_or(RouterError::ArithmeticOverflow)?;
        self.set_balance(asset, account, balance);
        Ok(())
    }

    pub fn transfer(
        &mut self,
        asset: Asset,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), RouterError> {
        if amount.is_zero() || from == to {
            return Ok(());
        }
        self.debit(asset, from, amount)?;
        self.credit(asset, to, amount)
    }

    // ── Allowances ───────────────────────────────────────────────────

    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    pub fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: U256) {
        let previous = self.allowance(token, owner, spender);
        self.journal.record(JournalEntry::Allowance { token, owner, spender, previous });
        write_or_remove(&mut self.allowances, (token, owner, spender), amount);
    }

    /// Move `owner`'s tokens on behalf of `spender`, consuming allowance
    pub fn transfer_from(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), RouterError> {
        let available = self.allowance(token, owner, spender);
        if available < amount {
            return Err(RouterError::InsufficientAuthorization {
                required: amount,
                available,
            });
        }
        if available != U256::MAX {
            self.approve(token, owner, spender, available - amount);
        }
        self.transfer(Asset::Token(token), owner, to, amount)
    }

    // ── Wrapped native ───────────────────────────────────────────────

    /// Wrap `amount` of `account`'s native balance 1:1
    pub fn deposit_native(&mut self, account: Address, amount: U256) -> Result<(), RouterError> {
        self.debit(Asset::Native, account, amount)?;
        self.credit(Asset::Token(self.wrapped_native), account, amount)?;
        debug!(account = %account, amount = %amount, "wrapped native");
        Ok(())
    }

    /// Unwrap `amount` of `account`'s wrapped balance 1:1
    pub fn withdraw_native(&mut self, account: Address, amount: U256) -> Result<(), RouterError> {
        self.debit(Asset::Token(self.wrapped_native), account, amount)?;
        self.credit(Asset::Native, account, amount)?;
        debug!(account = %account, amount = %amount, "unwrapped native");
        Ok(())
    }

    // ── Pairs ────────────────────────────────────────────────────────

    /// Register a pool; its reserves sync from whatever balances it already holds
    pub fn add_pair(&mut self, pair: Pair) {
        let address = pair.address;
        let mut pair = pair;
        pair.reserve0 = self.balance_of(Asset::Token(pair.token0), address);
        pair.reserve1 = self.balance_of(Asset::Token(pair.token1), address);

        self.journal.record(JournalEntry::PairAdded { pair: address });
        self.pairs.insert(address, pair);
    }

    pub fn pair(&self, address: Address) -> Option<&Pair> {
        self.pairs.get(&address)
    }

    pub fn pairs(&self) -> impl Iterator<Item = &Pair> {
        self.pairs.values()
    }

    /// Execute a V2-style swap on `pair_address`
    ///
    /// Outputs are sent first; the input is whatever the pool holds above its
    /// reserves. The fee-adjusted product of balances must not fall below the
    /// product of reserves, after which reserves sync to balances.
    pub fn swap_pair(
        &mut self,
        pair_address: Address,
        amount0_out: U256,
        amount1_out: U256,
        to: Address,
    ) -> Result<(), RouterError> {
        let pair = self
            .pairs
            .get(&pair_address)
            .cloned()
            .ok_or(RouterError::InsufficientLiquidity {
                venue: pair_address,
                reason: "unknown pair",
            })?;
        let insufficient = |reason| RouterError::InsufficientLiquidity {
            venue: pair_address,
            reason,
        };

        if amount0_out.is_zero() && amount1_out.is_zero() {
            return Err(insufficient("insufficient output amount"));
        }
        if amount0_out >= pair.reserve0 || amount1_out >= pair.reserve1 {
            return Err(insufficient("insufficient liquidity"));
        }
        if to == pair.token0 || to == pair.token1 {
            return Err(insufficient("invalid recipient"));
        }

        let token0 = Asset::Token(pair.token0);
        let token1 = Asset::Token(pair.token1);
        self.transfer(token0, pair_address, to, amount0_out)?;
        self.transfer(token1, pair_address, to, amount1_out)?;

        let balance0 = self.balance_of(token0, pair_address);
        let balance1 = self.balance_of(token1, pair_address);

        let amount0_in = amount_in_above(balance0, pair.reserve0 - amount0_out);
        let amount1_in = amount_in_above(balance1, pair.reserve1 - amount1_out);
        if amount0_in.is_zero() && amount1_in.is_zero() {
            return Err(insufficient("insufficient input amount"));
        }

        let adjusted0 = fee_adjusted(balance0, amount0_in)?;
        let adjusted1 = fee_adjusted(balance1, amount1_in)?;
        let k_after = adjusted0
            .checked_mul(adjusted1)
            .ok_or(RouterError::ArithmeticOverflow)?;
        let k_before = pair
            .reserve0
            .checked_mul(pair.reserve1)
            .and_then(|k| k.checked_mul(U256::from(K_SCALE)))
            .ok_or(RouterError::ArithmeticOverflow)?;
        if k_after < k_before {
            return Err(insufficient("constant product violated"));
        }

        self.set_reserves(pair_address, balance0, balance1);
        debug!(
            pair = %pair_address,
            amount0_in = %amount0_in,
            amount1_in = %amount1_in,
            amount0_out = %amount0_out,
            amount1_out = %amount1_out,
            to = %to,
            "pair swap"
        );
        Ok(())
    }

    // ── Nonces ───────────────────────────────────────────────────────

    pub fn is_nonce_used(&self, signer: Address, key: B256) -> bool {
        self.used_nonces.contains(&(signer, key))
    }

    /// Mark `key` used for `signer`; fails if it already was
    pub fn consume_nonce(&mut self, signer: Address, key: B256) -> Result<(), RouterError> {
        if !self.used_nonces.insert((signer, key)) {
            return Err(AuthFailure::AlreadyUsed { signer, key }.into());
        }
        self.journal.record(JournalEntry::Nonce { signer, key });
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn credit(&mut self, asset: Asset, account: Address, amount: U256) -> Result<(), RouterError> {
        let balance = self
            .balance_of(asset, account)
            .checked_add(amount)
            .ok_or(RouterError::ArithmeticOverflow)?;
        self.set_balance(asset, account, balance);
        Ok(())
    }

    fn debit(&mut self, asset: Asset, account: Address, amount: U256) -> Result<(), RouterError> {
        let available = self.balance_of(asset, account);
        if available < amount {
            return Err(RouterError::InsufficientBalance {
                asset,
                account,
                required: amount,
                available,
            });
        }
        self.set_balance(asset, account, available - amount);
        Ok(())
    }

    fn set_balance(&mut self, asset: Asset, account: Address, value: U256) {
        let previous = self.balance_of(asset, account);
        self.journal.record(JournalEntry::Balance { asset, account, previous });
        write_or_remove(&mut self.balances, (asset, account), value);
    }

    fn set_reserves(&mut self, pair: Address, reserve0: U256, reserve1: U256) {
        if let Some(state) = self.pairs.get_mut(&pair) {
            self.journal.record(JournalEntry::Reserves {
                pair,
                reserve0: state.reserve0,
                reserve1: state.reserve1,
            });
            state.reserve0 = reserve0;
            state.reserve1 = reserve1;
        }
    }
}

fn write_or_remove<K: std::hash::Hash + Eq>(map: &mut HashMap<K, U256>, key: K, value: U256) {
    if value.is_zero() {
        map.remove(&key);
    } else {
        map.insert(key, value);
    }
}

fn amount_in_above(balance: U256, floor: U256) -> U256 {
    balance.saturating_sub(floor)
}

/// balance * 1000 - amount_in * 3
fn fee_adjusted(balance: U256, amount_in: U256) -> Result<U256, RouterError> {
    let scaled = balance
        .checked_mul(U256::from(1000))
        .ok_or(RouterError::ArithmeticOverflow)?;
    let fee = amount_in
        .checked_mul(U256::from(3))
        .ok_or(RouterError::ArithmeticOverflow)?;
    scaled.checked_sub(fee).ok_or(RouterError::ArithmeticOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::venues::LiquidityVenue;
    use alloy::primitives::address;

    const WETH: Address = address!("eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee01");
    const DAI: Address = address!("dadadadadadadadadadadadadadadadadadadada");
    const PAIR: Address = address!("9999999999999999999999999999999999999999");

    fn alice() -> Address {
        Address::repeat_byte(0xa1)
    }

    fn seeded() -> Ledger {
        let mut ledger = Ledger::new(WETH);
        ledger.mint(Asset::Token(DAI), PAIR, U256::from(4_000_000u64)).unwrap();
        ledger.mint(Asset::Token(WETH), PAIR, U256::from(1_000u64)).unwrap();
        ledger.add_pair(Pair::new(PAIR, DAI, WETH));
        ledger.mint(Asset::Token(DAI), alice(), U256::from(10_000u64)).unwrap();
        ledger
    }

    #[test]
    fn test_transfer_and_balance() {
        let mut ledger = seeded();
        let bob = Address::repeat_byte(0xb0);
        ledger
            .transfer(Asset::Token(DAI), alice(), bob, U256::from(400))
            .unwrap();
        assert_eq!(ledger.balance_of(Asset::Token(DAI), alice()), U256::from(9_600));
        assert_eq!(ledger.balance_of(Asset::Token(DAI), bob), U256::from(400));

        let err = ledger
            .transfer(Asset::Token(DAI), bob, alice(), U256::from(401))
            .unwrap_err();
        assert!(matches!(err, RouterError::InsufficientBalance { .. }));
    }

    #[test]
    fn test_transfer_from_consumes_allowance() {
        let mut ledger = seeded();
        let spender = Address::repeat_byte(0x5e);
        ledger.approve(DAI, alice(), spender, U256::from(100));

        ledger
            .transfer_from(DAI, alice(), spender, spender, U256::from(60))
            .unwrap();
        assert_eq!(ledger.allowance(DAI, alice(), spender), U256::from(40));

        let err = ledger
            .transfer_from(DAI, alice(), spender, spender, U256::from(41))
            .unwrap_err();
        assert_eq!(
            err,
            RouterError::InsufficientAuthorization {
                required: U256::from(41),
                available: U256::from(40)
            }
        );

        ledger.approve(DAI, alice(), spender, U256::MAX);
        ledger
            .transfer_from(DAI, alice(), spender, spender, U256::from(1_000))
            .unwrap();
        assert_eq!(ledger.allowance(DAI, alice(), spender), U256::MAX);
    }

    #[test]
    fn test_wrap_and_unwrap() {
        let mut ledger = seeded();
        ledger.mint(Asset::Native, alice(), U256::from(5)).unwrap();
        ledger.deposit_native(alice(), U256::from(3)).unwrap();
        assert_eq!(ledger.balance_of(Asset::Native, alice()), U256::from(2));
        assert_eq!(ledger.balance_of(Asset::Token(WETH), alice()), U256::from(3));

        ledger.withdraw_native(alice(), U256::from(1)).unwrap();
        assert_eq!(ledger.balance_of(Asset::Native, alice()), U256::from(3));
        assert!(ledger.withdraw_native(alice(), U256::from(3)).is_err());
    }

    #[test]
    fn test_add_pair_syncs_reserves() {
        let ledger = seeded();
        let pair = ledger.pair(PAIR).unwrap();
        assert_eq!(pair.reserves(), (U256::from(4_000_000u64), U256::from(1_000u64)));
    }

    #[test]
    fn test_swap_pair_enforces_invariant() {
        let mut ledger = seeded();
        let quote = ledger.pair(PAIR).unwrap().amount_out(U256::from(8_000), true).unwrap();

        ledger
            .transfer(Asset::Token(DAI), alice(), PAIR, U256::from(8_000))
            .unwrap();

        // Asking for one unit more than the quote breaks K
        let greedy = ledger.swap_pair(PAIR, U256::ZERO, quote + U256::from(1), alice());
        assert!(matches!(greedy, Err(RouterError::InsufficientLiquidity { .. })));

        ledger.swap_pair(PAIR, U256::ZERO, quote, alice()).unwrap();
        assert_eq!(ledger.balance_of(Asset::Token(WETH), alice()), quote);

        let pair = ledger.pair(PAIR).unwrap();
        assert_eq!(pair.reserve0, U256::from(4_008_000u64));
        assert_eq!(pair.reserve1, U256::from(1_000u64) - quote);
    }

    #[test]
    fn test_swap_pair_without_input() {
        let mut ledger = seeded();
        let result = ledger.swap_pair(PAIR, U256::ZERO, U256::from(1), alice());
        assert!(matches!(
            result,
            Err(RouterError::InsufficientLiquidity {
                reason: "insufficient input amount",
                ..
            })
        ));
    }

    #[test]
    fn test_revert_restores_everything() {
        let mut ledger = seeded();
        let before = ledger.balances().clone();
        let reserves_before = ledger.pair(PAIR).unwrap().reserves();

        let cp = ledger.checkpoint();
        ledger
            .transfer(Asset::Token(DAI), alice(), PAIR, U256::from(8_000))
            .unwrap();
        ledger.swap_pair(PAIR, U256::ZERO, U256::from(1), alice()).unwrap();
        ledger.approve(DAI, alice(), PAIR, U256::from(7));
        ledger.consume_nonce(alice(), B256::repeat_byte(1)).unwrap();
        ledger.mint(Asset::Native, Address::repeat_byte(0x42), U256::from(1)).unwrap();
        ledger.revert_to(cp);

        assert_eq!(ledger.balances(), &before);
        assert_eq!(ledger.pair(PAIR).unwrap().reserves(), reserves_before);
        assert_eq!(ledger.allowance(DAI, alice(), PAIR), U256::ZERO);
        assert!(!ledger.is_nonce_used(alice(), B256::repeat_byte(1)));
    }

    #[test]
    fn test_commit_keeps_changes() {
        let mut ledger = seeded();
        let cp = ledger.checkpoint();
        ledger.consume_nonce(alice(), B256::repeat_byte(2)).unwrap();
        ledger.commit(cp);

        assert!(ledger.is_nonce_used(alice(), B256::repeat_byte(2)));
        let replay = ledger.consume_nonce(alice(), B256::repeat_byte(2));
        assert!(matches!(
            replay,
            Err(RouterError::AuthorizationFailed(AuthFailure::AlreadyUsed { .. }))
        ));
    }
}
