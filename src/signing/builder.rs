//! Transaction construction.
//!
//! Two paths, chosen by the request's [`TransferIntent`]:
//! - native: sun → whole TRX, node builds a `TransferContract`
//! - contract: `transfer(address,uint256)` call data, node builds a
//!   `TriggerSmartContract` with the configured fee ceiling

use alloy::primitives::U256;
use std::sync::Arc;

use crate::blockchain::abi::{encode_transfer_call, transfer_params};
use crate::blockchain::address::TronAddress;
use crate::blockchain::client::{ContractCall, NodeClient};
use crate::blockchain::transaction::{TxMetadata, UnsignedTransaction};
use crate::blockchain::types::Trx;
use crate::signing::error::BuildError;
use crate::signing::request::{SigningRequest, TransferIntent};

/// Builds unsigned transactions through the node.
#[derive(Clone)]
pub struct TransactionBuilder {
    node: Arc<dyn NodeClient>,
    fee_limit_sun: u64,
}

impl TransactionBuilder {
    pub fn new(node: Arc<dyn NodeClient>, fee_limit_sun: u64) -> Self {
        Self { node, fee_limit_sun }
    }

    pub fn fee_limit_sun(&self) -> u64 {
        self.fee_limit_sun
    }

    /// Build the template matching the request's intent.
    pub async fn build(&self, request: &SigningRequest) -> Result<UnsignedTransaction, BuildError> {
        let owner = parse_address("from", request.from())?;
        let to = parse_address("to", request.to())?;

        match request.intent() {
            TransferIntent::Native { amount_sun } => self.build_native(owner, to, *amount_sun).await,
            TransferIntent::Contract {
                token_contract,
                token_amount,
            } => {
                let contract = parse_address("tokenContract", token_contract)?;
                self.build_contract(owner, to, contract, *token_amount).await
            }
        }
    }

    /// Native coin transfer. The node takes whole TRX; sub-TRX remainders are dropped.
    pub async fn build_native(
        &self,
        owner: TronAddress,
        to: TronAddress,
        amount_sun: u64,
    ) -> Result<UnsignedTransaction, BuildError> {
        let (amount, remainder) = Trx::from_sun_truncating(amount_sun);
        if remainder != 0 {
            tracing::warn!(
                amount_sun = amount_sun,
                dropped_sun = remainder,
                amount_trx = amount.0,
                "Amount is not a whole number of TRX, remainder dropped"
            );
        }
        if amount.0 == 0 {
            return Err(BuildError::AmountBelowUnit { amount_sun });
        }

        let tx = self.node.create_transfer(&owner, &to, amount).await?;
        tracing::debug!(tx_id = %tx.tx_id, amount_trx = amount.0, "Native transfer template built");

        Ok(UnsignedTransaction::new(
            owner,
            tx,
            TxMetadata::Native { amount, amount_sun },
        ))
    }

    /// TRC-20 `transfer` invocation.
    pub async fn build_contract(
        &self,
        owner: TronAddress,
        to: TronAddress,
        contract: TronAddress,
        token_amount: U256,
    ) -> Result<UnsignedTransaction, BuildError> {
        if token_amount.is_zero() {
            return Err(BuildError::ZeroTokenAmount);
        }

        let call_data = encode_transfer_call(&to, token_amount);
        let call = ContractCall::transfer(
            owner,
            contract,
            transfer_params(&call_data).to_vec(),
            self.fee_limit_sun,
        );

        let tx = self
            .node
            .trigger_smart_contract(&call)
            .await?
            .ok_or(BuildError::MissingTransaction)?;
        tracing::debug!(
            tx_id = %tx.tx_id,
            contract = %contract,
            fee_limit_sun = self.fee_limit_sun,
            "Contract transfer template built"
        );

        Ok(UnsignedTransaction::new(
            owner,
            tx,
            TxMetadata::Contract {
                contract,
                call_data,
                fee_limit_sun: self.fee_limit_sun,
            },
        ))
    }
}

impl std::fmt::Debug for TransactionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionBuilder")
            .field("fee_limit_sun", &self.fee_limit_sun)
            .finish_non_exhaustive()
    }
}

/// Parse an account id supplied by the caller.
pub fn parse_address(field: &'static str, raw: &str) -> Result<TronAddress, BuildError> {
    raw.trim()
        .parse::<TronAddress>()
        .map_err(|source| BuildError::InvalidAddress { field, source })
}
