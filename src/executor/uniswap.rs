//! Uniswap Caller
//!
//! Reference executor over V2-style constant-product pairs.
//!
//! Payload (ABI-encoded as function parameters):
//! `(address[] path, bool[] directions, uint8 mode, uint256 thresholdAmount, bool unwrapNative)`
//!
//! - `directions[i] == true` means the hop sells `token0` of `path[i]`
//! - `thresholdAmount` is the fixed-side amount the payload was built for:
//!   the gross input for fixed input, the output for fixed output. The router
//!   may ask for less, never more (0 = not declared)
//! - native input is wrapped before the first hop; `unwrapNative` unwraps
//!   the final output
//!
//! Created: 2026-10-15

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::{sol_data, SolType};
use tracing::debug;

use super::{ExecutionContext, SwapExecutor, SwapRequest};
use crate::errors::RouterError;
use crate::ledger::Ledger;
use crate::types::{AmountMode, Asset};
use crate::venues::{LiquidityVenue, Pair};

type PayloadType = (
    sol_data::Array<sol_data::Address>,
    sol_data::Array<sol_data::Bool>,
    sol_data::Uint<8>,
    sol_data::Uint<256>,
    sol_data::Bool,
);

/// Decoded routing payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniswapPayload {
    pub path: Vec<Address>,
    pub directions: Vec<bool>,
    pub mode: AmountMode,
    pub fixed_side_amount: U256,
    pub unwrap_native: bool,
}

impl UniswapPayload {
    pub fn decode(data: &[u8]) -> Result<Self, RouterError> {
        let (path, directions, mode, fixed_side_amount, unwrap_native) =
            PayloadType::abi_decode_params(data)
                .map_err(|e| RouterError::InvalidPayload(format!("abi decode failed: {}", e)))?;

        let mode = AmountMode::from_u8(mode)
            .ok_or_else(|| RouterError::InvalidPayload(format!("unknown swap mode {}", mode)))?;

        if path.is_empty() {
            return Err(RouterError::InvalidPayload("empty path".to_string()));
        }
        if path.len() != directions.len() {
            return Err(RouterError::InvalidPayload(format!(
                "path has {} pairs but {} directions",
                path.len(),
                directions.len()
            )));
        }

        Ok(Self {
            path,
            directions,
            mode,
            fixed_side_amount,
            unwrap_native,
        })
    }

    pub fn encode(&self) -> Bytes {
        Bytes::from(PayloadType::abi_encode_params(&(
            self.path.clone(),
            self.directions.clone(),
            self.mode.as_u8(),
            self.fixed_side_amount,
            self.unwrap_native,
        )))
    }

    /// Reject a fixed-side amount above the one the payload declares
    fn check_fixed_side(&self, requested: U256) -> Result<(), RouterError> {
        if !self.fixed_side_amount.is_zero() && requested > self.fixed_side_amount {
            return Err(RouterError::InvalidPayload(format!(
                "{} amount {} exceeds declared {}",
                self.mode, requested, self.fixed_side_amount
            )));
        }
        Ok(())
    }
}

/// One validated hop
#[derive(Debug, Clone)]
struct Hop {
    pair: Pair,
    zero_for_one: bool,
}

impl Hop {
    fn token_in(&self) -> Address {
        self.pair.direction_tokens(self.zero_for_one).0
    }

    /// (amount0_out, amount1_out) for `pair.swap`
    fn outputs(&self, amount_out: U256) -> (U256, U256) {
        if self.zero_for_one {
            (U256::ZERO, amount_out)
        } else {
            (amount_out, U256::ZERO)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UniswapCaller;

impl UniswapCaller {
    pub fn new() -> Self {
        Self
    }

    /// Decode the payload and walk the path from input to output token
    fn resolve_route(
        &self,
        ledger: &Ledger,
        request: &SwapRequest<'_>,
    ) -> Result<(UniswapPayload, Vec<Hop>), RouterError> {
        let payload = UniswapPayload::decode(request.payload)?;
        if payload.mode != request.mode {
            return Err(RouterError::InvalidPayload(format!(
                "payload mode {} does not match swap mode {}",
                payload.mode, request.mode
            )));
        }
        if payload.unwrap_native != request.output.is_native() {
            return Err(RouterError::InvalidPayload(format!(
                "unwrapNative={} but output is {}",
                payload.unwrap_native, request.output
            )));
        }

        let wrapped = ledger.wrapped_native();
        let mut current = request.input.token().unwrap_or(wrapped);
        let mut hops = Vec::with_capacity(payload.path.len());

        for (index, (pair_address, zero_for_one)) in
            payload.path.iter().zip(payload.directions.iter()).enumerate()
        {
            let pair = ledger.pair(*pair_address).cloned().ok_or_else(|| {
                RouterError::InvalidPayload(format!("hop {}: unknown pair {}", index, pair_address))
            })?;
            let (token_in, token_out) = pair.direction_tokens(*zero_for_one);
            if token_in != current {
                return Err(RouterError::InvalidPayload(format!(
                    "hop {}: pair {} sells {} but route holds {}",
                    index, pair_address, token_in, current
                )));
            }
            current = token_out;
            hops.push(Hop {
                pair,
                zero_for_one: *zero_for_one,
            });
        }

        let expected_out = request.output.token().unwrap_or(wrapped);
        if current != expected_out {
            return Err(RouterError::InvalidPayload(format!(
                "route ends in {} but output is {}",
                current, request.output
            )));
        }

        Ok((payload, hops))
    }

    /// Move funds along the route; `amounts[i]` enters hop `i`, `amounts[i + 1]` leaves it
    fn settle(
        &self,
        ctx: &mut ExecutionContext<'_>,
        request: &SwapRequest<'_>,
        hops: &[Hop],
        amounts: &[U256],
    ) -> Result<(), RouterError> {
        let router = ctx.router;
        let amount_in = amounts[0];
        let amount_out = amounts[hops.len()];

        if request.input.is_native() {
            ctx.ledger.deposit_native(router, amount_in)?;
        }
        ctx.ledger.transfer(
            Asset::Token(hops[0].token_in()),
            router,
            hops[0].pair.address,
            amount_in,
        )?;

        for (index, hop) in hops.iter().enumerate() {
            let to = hops
                .get(index + 1)
                .map(|next| next.pair.address)
                .unwrap_or(router);
            let (amount0_out, amount1_out) = hop.outputs(amounts[index + 1]);
            ctx.ledger
                .swap_pair(hop.pair.address, amount0_out, amount1_out, to)?;
            debug!(
                hop = index,
                pair = %hop.pair.address,
                amount_in = %amounts[index],
                amount_out = %amounts[index + 1],
                "uniswap hop settled"
            );
        }

        if request.output.is_native() {
            ctx.ledger.withdraw_native(router, amount_out)?;
        }
        Ok(())
    }
}

impl SwapExecutor for UniswapCaller {
    fn name(&self) -> &str {
        "uniswap"
    }

    fn validate(&self, ledger: &Ledger, request: &SwapRequest<'_>) -> Result<(), RouterError> {
        self.resolve_route(ledger, request).map(|_| ())
    }

    fn execute_fixed_input(
        &self,
        ctx: &mut ExecutionContext<'_>,
        request: &SwapRequest<'_>,
        amount_in: U256,
    ) -> Result<U256, RouterError> {
        let (payload, hops) = self.resolve_route(ctx.ledger, request)?;
        payload.check_fixed_side(amount_in)?;

        let mut amounts = Vec::with_capacity(hops.len() + 1);
        amounts.push(amount_in);
        for hop in &hops {
            let next = hop.pair.amount_out(amounts[amounts.len() - 1], hop.zero_for_one)?;
            amounts.push(next);
        }

        let amount_out = amounts[hops.len()];
        self.settle(ctx, request, &hops, &amounts)?;
        Ok(amount_out)
    }

    fn execute_fixed_output(
        &self,
        ctx: &mut ExecutionContext<'_>,
        request: &SwapRequest<'_>,
        amount_out: U256,
        max_amount_in: U256,
    ) -> Result<U256, RouterError> {
        let (payload, hops) = self.resolve_route(ctx.ledger, request)?;
        payload.check_fixed_side(amount_out)?;

        let mut amounts = vec![U256::ZERO; hops.len() + 1];
        amounts[hops.len()] = amount_out;
        for (index, hop) in hops.iter().enumerate().rev() {
            amounts[index] = hop.pair.amount_in(amounts[index + 1], hop.zero_for_one)?;
        }

        if amounts[0] > max_amount_in {
            return Err(RouterError::SlippageExceeded {
                bound: max_amount_in,
                actual: amounts[0],
            });
        }

        self.settle(ctx, request, &hops, &amounts)?;
        Ok(amounts[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const WETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
    const DAI: Address = address!("6b175474e89094c44da98b954eedeac495271d0f");
    const USDC: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
    const DAI_WETH: Address = address!("a478c2975ab1ea89e8196811f51a7b7ade33eb11");
    const DAI_USDC: Address = address!("ae461ca67b15dc8dc81ce7615e0320da1a9ab8d5");
    const ROUTER: Address = address!("7777777777777777777777777777777777777777");

    fn ether(n: u64) -> U256 {
        U256::from(n) * U256::from(1_000_000_000_000_000_000u64)
    }

    fn world() -> Ledger {
        let mut ledger = Ledger::new(WETH);
        ledger.mint(Asset::Token(DAI), DAI_WETH, ether(4_000_000)).unwrap();
        ledger.mint(Asset::Token(WETH), DAI_WETH, ether(1_000)).unwrap();
        ledger.add_pair(Pair::new(DAI_WETH, DAI, WETH));

        ledger.mint(Asset::Token(DAI), DAI_USDC, ether(1_000_000)).unwrap();
        ledger
            .mint(Asset::Token(USDC), DAI_USDC, U256::from(1_000_000_000_000u64))
            .unwrap();
        ledger.add_pair(Pair::new(DAI_USDC, DAI, USDC));
        ledger
    }

    fn payload(path: Vec<Address>, directions: Vec<bool>, mode: AmountMode, fixed_side: U256, unwrap: bool) -> Bytes {
        UniswapPayload {
            path,
            directions,
            mode,
            fixed_side_amount: fixed_side,
            unwrap_native: unwrap,
        }
        .encode()
    }

    #[test]
    fn test_payload_encode_decode() {
        let encoded = payload(vec![DAI_WETH], vec![false], AmountMode::FixedInput, ether(1), false);
        let decoded = UniswapPayload::decode(&encoded).unwrap();
        assert_eq!(decoded.path, vec![DAI_WETH]);
        assert_eq!(decoded.directions, vec![false]);
        assert_eq!(decoded.mode, AmountMode::FixedInput);
        assert_eq!(decoded.fixed_side_amount, ether(1));
    }

    #[test]
    fn test_payload_rejects_malformed() {
        assert!(matches!(
            UniswapPayload::decode(&[0xde, 0xad]),
            Err(RouterError::InvalidPayload(_))
        ));

        let empty = payload(vec![], vec![], AmountMode::FixedInput, U256::ZERO, false);
        assert!(matches!(
            UniswapPayload::decode(&empty),
            Err(RouterError::InvalidPayload(_))
        ));

        let mismatched = payload(vec![DAI_WETH], vec![true, false], AmountMode::FixedInput, U256::ZERO, false);
        assert!(matches!(
            UniswapPayload::decode(&mismatched),
            Err(RouterError::InvalidPayload(_))
        ));

        let bad_mode = PayloadType::abi_encode_params(&(vec![DAI_WETH], vec![false], 7u8, U256::ZERO, false));
        assert!(matches!(
            UniswapPayload::decode(&bad_mode),
            Err(RouterError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_validate_checks_token_continuity() {
        let ledger = world();
        let caller = UniswapCaller::new();

        // DAI_WETH with direction true sells DAI, but the input is WETH
        let wrong_direction = payload(vec![DAI_WETH], vec![true], AmountMode::FixedInput, U256::ZERO, false);
        let request = SwapRequest {
            mode: AmountMode::FixedInput,
            input: Asset::Token(WETH),
            output: Asset::Token(DAI),
            payload: &wrong_direction,
        };
        assert!(matches!(
            caller.validate(&ledger, &request),
            Err(RouterError::InvalidPayload(_))
        ));

        // Native output requested without unwrapNative
        let no_unwrap = payload(vec![DAI_WETH], vec![true], AmountMode::FixedInput, U256::ZERO, false);
        let request = SwapRequest {
            mode: AmountMode::FixedInput,
            input: Asset::Token(DAI),
            output: Asset::Native,
            payload: &no_unwrap,
        };
        assert!(matches!(
            caller.validate(&ledger, &request),
            Err(RouterError::InvalidPayload(_))
        ));

        let multi_hop = payload(vec![DAI_WETH, DAI_USDC], vec![false, true], AmountMode::FixedInput, U256::ZERO, false);
        let request = SwapRequest {
            mode: AmountMode::FixedInput,
            input: Asset::Native,
            output: Asset::Token(USDC),
            payload: &multi_hop,
        };
        caller.validate(&ledger, &request).unwrap();
    }

    #[test]
    fn test_validate_rejects_mode_mismatch() {
        let ledger = world();
        let encoded = payload(vec![DAI_WETH], vec![false], AmountMode::FixedOutput, U256::ZERO, false);
        let request = SwapRequest {
            mode: AmountMode::FixedInput,
            input: Asset::Token(WETH),
            output: Asset::Token(DAI),
            payload: &encoded,
        };
        assert!(matches!(
            UniswapCaller::new().validate(&ledger, &request),
            Err(RouterError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_fixed_input_native_multi_hop() {
        let mut ledger = world();
        ledger.mint(Asset::Native, ROUTER, ether(1)).unwrap();

        let encoded = payload(vec![DAI_WETH, DAI_USDC], vec![false, true], AmountMode::FixedInput, U256::ZERO, false);
        let request = SwapRequest {
            mode: AmountMode::FixedInput,
            input: Asset::Native,
            output: Asset::Token(USDC),
            payload: &encoded,
        };

        let dai_quote = ledger.pair(DAI_WETH).unwrap().amount_out(ether(1), false).unwrap();
        let usdc_quote = ledger.pair(DAI_USDC).unwrap().amount_out(dai_quote, true).unwrap();

        let mut ctx = ExecutionContext::new(&mut ledger, ROUTER);
        let received = UniswapCaller::new()
            .execute_fixed_input(&mut ctx, &request, ether(1))
            .unwrap();

        assert_eq!(received, usdc_quote);
        assert_eq!(ledger.balance_of(Asset::Token(USDC), ROUTER), usdc_quote);
        assert_eq!(ledger.balance_of(Asset::Native, ROUTER), U256::ZERO);
        assert_eq!(ledger.balance_of(Asset::Token(DAI), ROUTER), U256::ZERO);
    }

    #[test]
    fn test_fixed_input_above_declared_amount() {
        let mut ledger = world();
        ledger.mint(Asset::Token(WETH), ROUTER, ether(2)).unwrap();

        // Built for 1 WETH gross; the router asks to swap 2
        let encoded = payload(vec![DAI_WETH], vec![false], AmountMode::FixedInput, ether(1), false);
        let request = SwapRequest {
            mode: AmountMode::FixedInput,
            input: Asset::Token(WETH),
            output: Asset::Token(DAI),
            payload: &encoded,
        };
        let mut ctx = ExecutionContext::new(&mut ledger, ROUTER);
        let result = UniswapCaller::new().execute_fixed_input(&mut ctx, &request, ether(2));
        assert!(matches!(result, Err(RouterError::InvalidPayload(_))));

        // Net of fees is below the declared gross amount
        let net = ether(98) / U256::from(100);
        let mut ctx = ExecutionContext::new(&mut ledger, ROUTER);
        let received = UniswapCaller::new()
            .execute_fixed_input(&mut ctx, &request, net)
            .unwrap();
        assert_eq!(ledger.balance_of(Asset::Token(DAI), ROUTER), received);
    }

    #[test]
    fn test_fixed_output_unwraps_and_respects_cap() {
        let mut ledger = world();
        ledger.mint(Asset::Token(DAI), ROUTER, ether(5_000)).unwrap();

        let encoded = payload(vec![DAI_WETH], vec![true], AmountMode::FixedOutput, U256::ZERO, true);
        let request = SwapRequest {
            mode: AmountMode::FixedOutput,
            input: Asset::Token(DAI),
            output: Asset::Native,
            payload: &encoded,
        };
        let needed = ledger.pair(DAI_WETH).unwrap().amount_in(ether(1), true).unwrap();

        // Cap below what the pool needs
        {
            let mut ctx = ExecutionContext::new(&mut ledger, ROUTER);
            let result = UniswapCaller::new().execute_fixed_output(&mut ctx, &request, ether(1), ether(3_000));
            assert!(matches!(result, Err(RouterError::SlippageExceeded { .. })));
        }

        let mut ctx = ExecutionContext::new(&mut ledger, ROUTER);
        let spent = UniswapCaller::new()
            .execute_fixed_output(&mut ctx, &request, ether(1), ether(5_000))
            .unwrap();

        assert_eq!(spent, needed);
        assert_eq!(ledger.balance_of(Asset::Native, ROUTER), ether(1));
        assert_eq!(ledger.balance_of(Asset::Token(DAI), ROUTER), ether(5_000) - needed);
    }

    #[test]
    fn test_fixed_output_above_declared_amount() {
        let mut ledger = world();
        ledger.mint(Asset::Token(DAI), ROUTER, ether(5_000)).unwrap();

        let encoded = payload(
            vec![DAI_WETH],
            vec![true],
            AmountMode::FixedOutput,
            ether(1) / U256::from(2),
            false,
        );
        let request = SwapRequest {
            mode: AmountMode::FixedOutput,
            input: Asset::Token(DAI),
            output: Asset::Token(WETH),
            payload: &encoded,
        };
        let mut ctx = ExecutionContext::new(&mut ledger, ROUTER);
        let result = UniswapCaller::new().execute_fixed_output(&mut ctx, &request, ether(1), ether(5_000));
        assert!(matches!(result, Err(RouterError::InvalidPayload(_))));
    }

    #[test]
    fn test_not_enough_liquidity() {
        let mut ledger = world();
        ledger.mint(Asset::Token(DAI), ROUTER, ether(4_000_000)).unwrap();

        let encoded = payload(vec![DAI_WETH], vec![true], AmountMode::FixedOutput, U256::ZERO, false);
        let request = SwapRequest {
            mode: AmountMode::FixedOutput,
            input: Asset::Token(DAI),
            output: Asset::Token(WETH),
            payload: &encoded,
        };
        let mut ctx = ExecutionContext::new(&mut ledger, ROUTER);
        let result = UniswapCaller::new().execute_fixed_output(&mut ctx, &request, ether(20_000), ether(4_000_000));
        assert!(matches!(result, Err(RouterError::InsufficientLiquidity { .. })));
    }
}
