//! TRC-20 `transfer(address,uint256)` call encoding.
//!
//! TRON contracts use the Ethereum ABI unchanged; addresses are encoded by
//! their 20-byte body (the `0x41` prefix is dropped) left-padded to 32 bytes.

use alloy::primitives::{Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

use crate::blockchain::address::TronAddress;

sol! {
    function transfer(address to, uint256 amount) returns (bool);
}

/// Function signature string the node expects as `function_selector`.
pub const TRANSFER_SIGNATURE: &str = "transfer(address,uint256)";

/// Length of the encoded `(address, uint256)` parameter block.
pub const TRANSFER_PARAMS_LEN: usize = 64;

/// Full call data: 4-byte selector followed by the encoded parameters.
pub fn encode_transfer_call(to: &TronAddress, amount: U256) -> Bytes {
    let call = transferCall {
        to: to.evm(),
        amount,
    };
    Bytes::from(call.abi_encode())
}

/// Parameter block only, as sent in `triggersmartcontract.parameter`.
pub fn transfer_params(call_data: &[u8]) -> &[u8] {
    call_data.get(transferCall::SELECTOR.len()..).unwrap_or_default()
}

/// The 4-byte selector of `transfer(address,uint256)`.
pub fn transfer_selector() -> [u8; 4] {
    transferCall::SELECTOR
}
