use pqcrypto_dilithium::dilithium2;
use pqcrypto_traits::sign::{DetachedSignature, PublicKey, SecretKey};
use zeroize::Zeroizing;

use redeemer_core::error::RedeemerError;
use redeemer_core::instruction::{Request, SignedRequest};
use redeemer_core::types::{AccountId, DilithiumPublicKey, DilithiumSignature};

use crate::hash::account_id_from_pubkey;

/// Sign `message` with a Dilithium2 secret key. Returns a detached signature.
pub fn sign(secret_key_bytes: &[u8], message: &[u8]) -> Result<DilithiumSignature, RedeemerError> {
    let sk = dilithium2::SecretKey::from_bytes(secret_key_bytes)
        .map_err(|_| RedeemerError::InvalidSignature)?;
    let sig = dilithium2::detached_sign(message, &sk);
    Ok(DilithiumSignature(sig.as_bytes().to_vec()))
}

/// Verify a detached Dilithium2 signature.
pub fn verify_signature(
    public_key: &DilithiumPublicKey,
    message: &[u8],
    signature: &DilithiumSignature,
) -> Result<(), RedeemerError> {
    let pk = dilithium2::PublicKey::from_bytes(&public_key.0)
        .map_err(|_| RedeemerError::InvalidSignature)?;
    let sig = dilithium2::DetachedSignature::from_bytes(&signature.0)
        .map_err(|_| RedeemerError::InvalidSignature)?;
    dilithium2::verify_detached_signature(&sig, message, &pk)
        .map_err(|_| RedeemerError::InvalidSignature)
}

/// Check that `signed.request.caller` owns `signed.public_key` and signed the
/// request body. Returns the request the engine may act on.
///
/// A key that hashes to a different account is `Unauthorized`; a signature
/// that does not verify is `InvalidSignature`.
pub fn verify_request(signed: &SignedRequest) -> Result<&Request, RedeemerError> {
    if account_id_from_pubkey(&signed.public_key.0) != signed.request.caller {
        return Err(RedeemerError::Unauthorized);
    }
    let body = signed.request.body_bytes()?;
    verify_signature(&signed.public_key, &body, &signed.signature)?;
    Ok(&signed.request)
}

/// Dilithium2 keypair with its derived AccountId.
pub struct KeyPair {
    pub account_id: AccountId,
    pub public_key: DilithiumPublicKey,
    secret_key: Zeroizing<Vec<u8>>,
}

impl KeyPair {
    pub fn generate() -> Self {
        let (pk, sk) = dilithium2::keypair();
        let pk_bytes = pk.as_bytes().to_vec();
        Self {
            account_id: account_id_from_pubkey(&pk_bytes),
            public_key: DilithiumPublicKey(pk_bytes),
            secret_key: Zeroizing::new(sk.as_bytes().to_vec()),
        }
    }

    pub fn sign(&self, message: &[u8]) -> Result<DilithiumSignature, RedeemerError> {
        sign(&self.secret_key, message)
    }

    /// Sign `request` as its caller. The request's `caller` must be this key's account.
    pub fn sign_request(&self, request: Request) -> Result<SignedRequest, RedeemerError> {
        if request.caller != self.account_id {
            return Err(RedeemerError::Unauthorized);
        }
        let signature = self.sign(&request.body_bytes()?)?;
        Ok(SignedRequest { request, public_key: self.public_key.clone(), signature })
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyPair {{ account_id: {:?} }}", self.account_id)
    }
}
