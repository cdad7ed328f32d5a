//! Digest signing with the held key.

use std::sync::Arc;

use crate::blockchain::transaction::{SignedTransaction, UnsignedTransaction};
use crate::blockchain::wallet::Wallet;
use crate::config::schema::OwnerPolicy;
use crate::signing::error::SigningError;

/// Signs unsigned transactions with the service wallet.
#[derive(Debug, Clone)]
pub struct TxSigner {
    wallet: Arc<Wallet>,
    owner_policy: OwnerPolicy,
}

impl TxSigner {
    pub fn new(wallet: Arc<Wallet>, owner_policy: OwnerPolicy) -> Self {
        Self { wallet, owner_policy }
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn owner_policy(&self) -> OwnerPolicy {
        self.owner_policy
    }

    /// Sign `unsigned`.
    ///
    /// The digest is recomputed from `raw_data_hex` and must equal the id
    /// the node reported, so the signature covers exactly what the node
    /// will verify.
    pub fn sign(&self, unsigned: UnsignedTransaction) -> Result<SignedTransaction, SigningError> {
        self.check_owner(&unsigned)?;

        let digest = unsigned
            .digest()
            .map_err(|e| SigningError::RawData(e.to_string()))?;
        let computed = hex::encode(digest);
        if !computed.eq_ignore_ascii_case(unsigned.tx_id().trim()) {
            return Err(SigningError::DigestMismatch {
                reported: unsigned.tx_id().to_string(),
                computed,
            });
        }

        let signature = self.wallet.sign_digest(digest)?;
        let signed = SignedTransaction::new(unsigned, vec![signature.as_bytes().to_vec()]);
        signed.validate()?;

        tracing::debug!(tx_id = %signed.tx_id(), "Transaction signed");
        Ok(signed)
    }

    fn check_owner(&self, unsigned: &UnsignedTransaction) -> Result<(), SigningError> {
        let signer = self.wallet.address();
        let owner = unsigned.owner();
        if signer == owner {
            return Ok(());
        }
        match self.owner_policy {
            OwnerPolicy::Warn => {
                tracing::warn!(
                    owner = %owner,
                    signer = %signer,
                    "Signing key does not own the source account; node will likely reject"
                );
                Ok(())
            }
            OwnerPolicy::Enforce => Err(SigningError::OwnerMismatch {
                owner: owner.to_base58(),
                signer: signer.to_base58(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::address::TronAddress;
    use crate::blockchain::transaction::TxMetadata;
    use crate::blockchain::types::{TronTransaction, Trx};
    use sha2::{Digest, Sha256};

    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const OTHER: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";

    fn wallet() -> Arc<Wallet> {
        Arc::new(Wallet::from_private_key(TEST_PRIVATE_KEY).unwrap())
    }

    fn unsigned(owner: TronAddress) -> UnsignedTransaction {
        let raw = b"\x0a\x02\xbe\xef transfer".to_vec();
        let tx = TronTransaction {
            tx_id: hex::encode(Sha256::digest(&raw)),
            raw_data: serde_json::json!({}),
            raw_data_hex: hex::encode(&raw),
            visible: true,
        };
        UnsignedTransaction::new(owner, tx, TxMetadata::Native { amount: Trx(1), amount_sun: 1_000_000 })
    }

    #[test]
    fn test_sign_produces_recoverable_signature() {
        let wallet = wallet();
        let signer = TxSigner::new(wallet.clone(), OwnerPolicy::Enforce);
        let tx = unsigned(wallet.address());
        let digest = tx.digest().unwrap();

        let signed = signer.sign(tx).unwrap();
        assert_eq!(signed.signatures().len(), 1);

        let sig = alloy::signers::Signature::try_from(signed.signatures()[0].as_slice()).unwrap();
        let recovered = sig.recover_address_from_prehash(&digest).unwrap();
        assert_eq!(TronAddress::from_evm(recovered), wallet.address());
    }

    #[test]
    fn test_digest_mismatch() {
        let wallet = wallet();
        let signer = TxSigner::new(wallet.clone(), OwnerPolicy::Warn);
        let mut tx = unsigned(wallet.address());
        let mut template = tx.tx().clone();
        template.tx_id = "ff".repeat(32);
        tx = UnsignedTransaction::new(tx.owner(), template, tx.metadata().clone());

        let err = signer.sign(tx).unwrap_err();
        assert!(matches!(err, SigningError::DigestMismatch { .. }));
    }

    #[test]
    fn test_bad_raw_hex() {
        let wallet = wallet();
        let signer = TxSigner::new(wallet.clone(), OwnerPolicy::Warn);
        let tx = unsigned(wallet.address());
        let mut template = tx.tx().clone();
        template.raw_data_hex = "xyz".into();
        let tx = UnsignedTransaction::new(tx.owner(), template, tx.metadata().clone());
        assert!(matches!(signer.sign(tx).unwrap_err(), SigningError::RawData(_)));
    }

    #[test]
    fn test_owner_policy() {
        let other: TronAddress = OTHER.parse().unwrap();

        let warn = TxSigner::new(wallet(), OwnerPolicy::Warn);
        assert!(warn.sign(unsigned(other)).is_ok());

        let enforce = TxSigner::new(wallet(), OwnerPolicy::Enforce);
        match enforce.sign(unsigned(other)).unwrap_err() {
            SigningError::OwnerMismatch { owner, signer } => {
                assert_eq!(owner, OTHER);
                assert_eq!(signer, wallet().address().to_base58());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
