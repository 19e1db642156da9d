use serde::{Deserialize, Serialize};

use relay_crypto::{KeyPair, Signature, VerifyingKey};
use relay_types::{AccountId, BlockHeight};

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::PROTOCOL_VERSION;

const SIGNING_DOMAIN: &[u8] = b"relay-subscribe-v1:";

/// Request to stream every block after `after`, signed by the account key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub version: u32,
    pub account: AccountId,
    pub after: BlockHeight,
    pub public_key: [u8; 32],
    pub signature: Signature,
}

impl SubscribeRequest {
    pub fn signed(account: AccountId, after: BlockHeight, keys: &KeyPair) -> Self {
        let public_key = keys.verifying_key().to_bytes();
        let message = signing_bytes(PROTOCOL_VERSION, &account, after, &public_key);
        let signature = keys.signing_key().sign(&message);
        Self {
            version: PROTOCOL_VERSION,
            account,
            after,
            public_key,
            signature,
        }
    }

    /// Check the signature against the embedded public key.
    ///
    /// Whether that key is allowed to read blocks for `account` is the
    /// ledger's decision; this only proves possession of the key.
    pub fn verify(&self) -> ProtocolResult<VerifyingKey> {
        if self.version != PROTOCOL_VERSION {
            return Err(ProtocolError::VersionMismatch {
                local: PROTOCOL_VERSION,
                remote: self.version,
            });
        }
        let key = VerifyingKey::from_bytes(self.public_key)
            .map_err(|e| ProtocolError::Unauthorized(e.to_string()))?;
        let message = signing_bytes(self.version, &self.account, self.after, &self.public_key);
        key.verify(&message, &self.signature)
            .map_err(|e| ProtocolError::Unauthorized(e.to_string()))?;
        Ok(key)
    }

    /// Height of the first block the subscriber expects.
    pub fn first_height(&self) -> BlockHeight {
        self.after.next()
    }
}

fn signing_bytes(
    version: u32,
    account: &AccountId,
    after: BlockHeight,
    public_key: &[u8; 32],
) -> Vec<u8> {
    let account = account.to_string();
    let mut buf = Vec::with_capacity(SIGNING_DOMAIN.len() + 4 + 4 + account.len() + 8 + 32);
    buf.extend_from_slice(SIGNING_DOMAIN);
    buf.extend_from_slice(&version.to_be_bytes());
    buf.extend_from_slice(&(account.len() as u32).to_be_bytes());
    buf.extend_from_slice(account.as_bytes());
    buf.extend_from_slice(&after.get().to_be_bytes());
    buf.extend_from_slice(public_key);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use relay_crypto::SigningKey;

    fn keys(seed: u64) -> KeyPair {
        KeyPair::new(SigningKey::generate_with(&mut StdRng::seed_from_u64(seed)))
    }

    fn account() -> AccountId {
        "relay@notary".parse().unwrap()
    }

    #[test]
    fn signed_request_verifies() {
        let kp = keys(1);
        let req = SubscribeRequest::signed(account(), BlockHeight::new(7), &kp);
        assert_eq!(req.verify().unwrap(), kp.verifying_key());
        assert_eq!(req.first_height(), BlockHeight::new(8));
    }

    #[test]
    fn tampered_height_fails() {
        let mut req = SubscribeRequest::signed(account(), BlockHeight::new(7), &keys(2));
        req.after = BlockHeight::ZERO;
        assert!(matches!(req.verify(), Err(ProtocolError::Unauthorized(_))));
    }

    #[test]
    fn tampered_account_fails() {
        let mut req = SubscribeRequest::signed(account(), BlockHeight::new(7), &keys(3));
        req.account = "admin@notary".parse().unwrap();
        assert!(req.verify().is_err());
    }

    #[test]
    fn swapped_key_fails() {
        let mut req = SubscribeRequest::signed(account(), BlockHeight::new(7), &keys(4));
        req.public_key = keys(5).verifying_key().to_bytes();
        assert!(req.verify().is_err());
    }

    #[test]
    fn version_mismatch_reported() {
        let mut req = SubscribeRequest::signed(account(), BlockHeight::ZERO, &keys(6));
        req.version = 99;
        assert!(matches!(
            req.verify(),
            Err(ProtocolError::VersionMismatch { local: 1, remote: 99 })
        ));
    }
}
