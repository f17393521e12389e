//! External Account Binding (RFC 8555 section 7.3.4).

use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::sign::Signer;
use serde::{Deserialize, Serialize};

use crate::key::Jwk;
use crate::{b64u, Error};

/// The inner HS256 JWS embedded into a new-account request as the
/// `externalAccountBinding` member.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExternalAccountBinding {
    /// JOSE Header (see RFC 7515).
    pub protected: String,
    /// Payload: the base64url encoded account JWK.
    pub payload: String,
    /// HMAC signature.
    pub signature: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Protected<'a> {
    alg: &'static str,
    url: &'a str,
    kid: &'a str,
}

/// Pre-provisioned CA credentials binding a new ACME account to an external
/// one.
pub struct ExternalAccountKey {
    /// The key identifier handed out by the CA.
    pub kid: String,
    key: PKey<Private>,
}

impl ExternalAccountKey {
    /// Create the binding key from the CA-supplied key identifier and the
    /// base64 encoded HMAC key. Both base64 alphabets are accepted, padded or
    /// not, since CAs are not consistent about the encoding they emit.
    pub fn new(kid: impl Into<String>, hmac_key: &str) -> Result<Self, Error> {
        Self::from_raw(kid, &b64u::decode_auto(hmac_key)?)
    }

    /// Create the binding key from raw HMAC key material.
    pub fn from_raw(kid: impl Into<String>, hmac_key: &[u8]) -> Result<Self, Error> {
        Ok(Self {
            kid: kid.into(),
            key: PKey::hmac(hmac_key)?,
        })
    }

    /// Build the inner JWS over the account's public JWK.
    ///
    /// This is a pure function of the credentials, the account key and the
    /// `newAccount` URL; no I/O and no nonce are involved.
    pub fn binding(&self, account_jwk: &Jwk, url: &str) -> Result<ExternalAccountBinding, Error> {
        let protected = Protected {
            alg: "HS256",
            url,
            kid: &self.kid,
        };
        let protected = b64u::encode(serde_json::to_string(&protected)?.as_bytes());
        let payload = b64u::encode(serde_json::to_string(account_jwk)?.as_bytes());

        let mut signer = Signer::new(MessageDigest::sha256(), &self.key)?;
        signer.update(protected.as_bytes())?;
        signer.update(b".")?;
        signer.update(payload.as_bytes())?;
        let signature = b64u::encode(&signer.sign_to_vec()?);

        Ok(ExternalAccountBinding {
            protected,
            payload,
            signature,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::key::AccountKey;

    #[test]
    fn binding_signs_the_account_jwk() {
        let account = AccountKey::generate_rsa().unwrap();
        let eab = ExternalAccountKey::from_raw("kid-123", b"top-secret").unwrap();

        let binding = eab
            .binding(
                &account.public_jwk().unwrap(),
                "https://ca.example/newAccount",
            )
            .unwrap();

        let header: Value =
            serde_json::from_slice(&b64u::decode(&binding.protected).unwrap()).unwrap();
        assert_eq!(header["alg"], "HS256");
        assert_eq!(header["kid"], "kid-123");
        assert_eq!(header["url"], "https://ca.example/newAccount");

        let payload: Value =
            serde_json::from_slice(&b64u::decode(&binding.payload).unwrap()).unwrap();
        assert_eq!(
            payload,
            serde_json::to_value(account.public_jwk().unwrap()).unwrap()
        );

        // recompute the HMAC independently
        let key = PKey::hmac(b"top-secret").unwrap();
        let mut signer = Signer::new(MessageDigest::sha256(), &key).unwrap();
        signer
            .update(format!("{}.{}", binding.protected, binding.payload).as_bytes())
            .unwrap();
        assert_eq!(b64u::encode(&signer.sign_to_vec().unwrap()), binding.signature);
    }

    #[test]
    fn hmac_key_decoding_is_alphabet_agnostic() {
        let a = ExternalAccountKey::new("k", "0twaM-fK_6yfQ_rxH4eZdqj1O6blhB2").unwrap();
        let b = ExternalAccountKey::new("k", "0twaM+fK_6yfQ/rxH4eZdqj1O6blhB2").unwrap();
        let account = AccountKey::generate_rsa().unwrap();
        let jwk = account.public_jwk().unwrap();
        assert_eq!(
            a.binding(&jwk, "url").unwrap(),
            b.binding(&jwk, "url").unwrap()
        );
    }
}
