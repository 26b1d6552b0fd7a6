//! Contract interfaces and calldata helpers

use crate::error::{ClaimerError, ClaimerResult};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

sol! {
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
    }

    interface IZroClaim {
        function donateAndClaim(
            uint8 currency,
            uint256 amountToDonate,
            uint256 zroAmount,
            bytes32[] calldata proof,
            address to,
            bytes calldata extraBytes
        ) external payable;

        function requiredDonation(uint256 zroAmount)
            external
            view
            returns (uint256 usdc, uint256 usdt, uint256 native);

        function quoteClaimCallback(uint8 currency, uint256 amountToDonate)
            external
            view
            returns (uint256 nativeFee, uint256 lzTokenFee);
    }
}

/// Donation currency selector for the chain's native coin
pub const NATIVE_CURRENCY: u8 = 2;

pub fn encode_balance_of(owner: Address) -> Bytes {
    IERC20::balanceOfCall { account: owner }.abi_encode().into()
}

pub fn decode_balance(raw: &Bytes) -> ClaimerResult<U256> {
    IERC20::balanceOfCall::abi_decode_returns(raw)
        .map_err(|e| ClaimerError::RpcError(format!("Failed to decode balanceOf result: {}", e)))
}

pub fn encode_transfer(to: Address, amount: U256) -> Bytes {
    IERC20::transferCall { to, amount }.abi_encode().into()
}

/// Calldata for a native-currency donate-and-claim
pub fn encode_donate_and_claim(donation: U256, zro_amount: U256, proof: &[B256], to: Address) -> Bytes {
    IZroClaim::donateAndClaimCall {
        currency: NATIVE_CURRENCY,
        amountToDonate: donation,
        zroAmount: zro_amount,
        proof: proof.to_vec(),
        to,
        extraBytes: Bytes::new(),
    }
    .abi_encode()
    .into()
}

pub fn encode_required_donation(zro_amount: U256) -> Bytes {
    IZroClaim::requiredDonationCall { zroAmount: zro_amount }.abi_encode().into()
}

/// Native-coin component of the required donation
pub fn decode_required_native_donation(raw: &Bytes) -> ClaimerResult<U256> {
    IZroClaim::requiredDonationCall::abi_decode_returns(raw)
        .map(|quote| quote.native)
        .map_err(|e| ClaimerError::RpcError(format!("Failed to decode requiredDonation result: {}", e)))
}

pub fn encode_quote_claim_callback(donation: U256) -> Bytes {
    IZroClaim::quoteClaimCallbackCall {
        currency: NATIVE_CURRENCY,
        amountToDonate: donation,
    }
    .abi_encode()
    .into()
}

/// Native messaging fee from a callback quote
pub fn decode_claim_callback_fee(raw: &Bytes) -> ClaimerResult<U256> {
    IZroClaim::quoteClaimCallbackCall::abi_decode_returns(raw)
        .map(|quote| quote.nativeFee)
        .map_err(|e| ClaimerError::RpcError(format!("Failed to decode quoteClaimCallback result: {}", e)))
}
