//! Flattened JSON JWS serialization (RFC 7515) with the ACME protected
//! header.

use openssl::hash::{Hasher, MessageDigest};
use openssl::sign::Signer;
use serde::Serialize;

use crate::b64u;
use crate::key::{AccountKey, Jwk, PublicKey};
use crate::Error;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Protected<'a> {
    alg: &'static str,
    nonce: &'a str,
    url: &'a str,
    #[serde(flatten)]
    key: KeyId<'a>,
}

/// Acme requires the use of *either* `jwk` *or* `kid` depending on the action
/// taken.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum KeyId<'a> {
    /// This is the actual JWK structure, used before an account exists.
    Jwk(Jwk),

    /// This should be the account location.
    Kid(&'a str),
}

/// A signed request body in the flattened JSON serialization.
#[derive(Debug, Serialize)]
pub struct Jws {
    /// base64url encoded protected header.
    pub protected: String,

    /// base64url encoded payload. Empty for "POST-as-GET" requests.
    pub payload: String,

    /// base64url encoded signature over `protected || "." || payload`.
    pub signature: String,
}

impl Jws {
    /// Sign a JSON payload bound to `url` and `nonce`.
    ///
    /// When `kid` is `None` the public JWK is embedded instead, which is only
    /// correct for new-account requests.
    pub fn new<T: Serialize>(
        key: &AccountKey,
        kid: Option<&str>,
        url: &str,
        nonce: &str,
        payload: &T,
    ) -> Result<Self, Error> {
        Self::new_full(
            key,
            kid,
            url,
            nonce,
            b64u::encode(serde_json::to_string(payload)?.as_bytes()),
        )
    }

    /// Sign an empty payload, the ACME idiom for fetching protected
    /// resources.
    pub fn new_post_as_get(
        key: &AccountKey,
        kid: Option<&str>,
        url: &str,
        nonce: &str,
    ) -> Result<Self, Error> {
        Self::new_full(key, kid, url, nonce, String::new())
    }

    /// Sign an already base64url encoded payload.
    pub fn new_full(
        key: &AccountKey,
        kid: Option<&str>,
        url: &str,
        nonce: &str,
        payload: String,
    ) -> Result<Self, Error> {
        let public = key.public_key()?;

        let protected = Protected {
            alg: public.alg(),
            nonce,
            url,
            key: match kid {
                Some(kid) => KeyId::Kid(kid),
                None => KeyId::Jwk(key.public_jwk()?),
            },
        };
        let protected = b64u::encode(serde_json::to_string(&protected)?.as_bytes());

        let signature = match public {
            PublicKey::Rsa(_) => Self::sign_rsa(key, protected.as_bytes(), payload.as_bytes())?,
            PublicKey::Ec(_) => Self::sign_ec(key, protected.as_bytes(), payload.as_bytes())?,
        };

        Ok(Jws {
            protected,
            payload,
            signature: b64u::encode(&signature),
        })
    }

    fn sign_rsa(key: &AccountKey, protected: &[u8], payload: &[u8]) -> Result<Vec<u8>, Error> {
        let mut signer = Signer::new(MessageDigest::sha256(), key.pkey())?;
        signer.set_rsa_padding(openssl::rsa::Padding::PKCS1)?;
        signer.update(protected)?;
        signer.update(b".")?;
        signer.update(payload)?;
        Ok(signer.sign_to_vec()?)
    }

    fn sign_ec(key: &AccountKey, protected: &[u8], payload: &[u8]) -> Result<Vec<u8>, Error> {
        // ES256 signatures are the fixed-width r || s concatenation, not DER
        const EC_ORDER_BYTES: usize = 32;

        let mut hasher = Hasher::new(MessageDigest::sha256())?;
        hasher.update(protected)?;
        hasher.update(b".")?;
        hasher.update(payload)?;
        let digest = hasher.finish()?;
        let ec_key = key.pkey().ec_key()?;
        let sig = openssl::ecdsa::EcdsaSig::sign(digest.as_ref(), &ec_key)?;

        let r = sig.r().to_vec();
        let s = sig.s().to_vec();
        let mut out = Vec::with_capacity(2 * EC_ORDER_BYTES);
        out.extend(std::iter::repeat(0u8).take(EC_ORDER_BYTES - r.len()));
        out.extend(r);
        out.extend(std::iter::repeat(0u8).take(EC_ORDER_BYTES - s.len()));
        out.extend(s);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn decode_json(b64: &str) -> Value {
        serde_json::from_slice(&b64u::decode(b64).unwrap()).unwrap()
    }

    #[test]
    fn first_contact_jws_embeds_the_jwk() {
        let key = AccountKey::generate_rsa().unwrap();
        let payload = json!({
            "termsOfServiceAgreed": true,
            "contact": ["mailto:cert-admin@example.org", "mailto:admin@example.org"],
        });
        let nonce = b64u::encode(b"12345");
        let jws = Jws::new(&key, None, "1234", &nonce, &payload).unwrap();

        let header = decode_json(&jws.protected);
        assert_eq!(header["alg"], "RS256");
        assert_eq!(header["nonce"], "MTIzNDU");
        assert_eq!(header["url"], "1234");
        assert_eq!(header["jwk"]["kty"], "RSA");
        assert!(header.get("kid").is_none());
        assert_eq!(decode_json(&jws.payload), payload);
    }

    #[test]
    fn bound_jws_uses_the_kid() {
        let key = AccountKey::generate_rsa().unwrap();
        let jws = Jws::new(
            &key,
            Some("https://ca.example/acct/17"),
            "https://ca.example/order",
            "bm9uY2U",
            &json!({}),
        )
        .unwrap();

        let header = decode_json(&jws.protected);
        assert_eq!(header["kid"], "https://ca.example/acct/17");
        assert!(header.get("jwk").is_none());
    }

    #[test]
    fn post_as_get_payload_is_empty() {
        let key = AccountKey::generate_rsa().unwrap();
        let jws = Jws::new_post_as_get(&key, Some("kid"), "url", "bm9uY2U").unwrap();
        assert!(jws.payload.is_empty());
        assert!(!jws.signature.is_empty());
    }

    #[test]
    fn rsa_signature_is_deterministic_and_verifies() {
        let key = AccountKey::generate_rsa().unwrap();
        let payload = json!({"termsOfServiceAgreed": true, "contact": []});
        let nonce = b64u::encode(b"12345");

        let a = Jws::new(&key, None, "1234", &nonce, &payload).unwrap();
        let b = Jws::new(&key, None, "1234", &nonce, &payload).unwrap();
        assert_eq!(a.protected, b.protected);
        assert_eq!(a.payload, b.payload);
        assert_eq!(a.signature, b.signature);

        let mut verifier =
            openssl::sign::Verifier::new(MessageDigest::sha256(), key.pkey()).unwrap();
        verifier
            .set_rsa_padding(openssl::rsa::Padding::PKCS1)
            .unwrap();
        verifier.update(a.protected.as_bytes()).unwrap();
        verifier.update(b".").unwrap();
        verifier.update(a.payload.as_bytes()).unwrap();
        assert!(verifier
            .verify(&b64u::decode(&a.signature).unwrap())
            .unwrap());
    }

    #[test]
    fn ec_signature_is_fixed_width() {
        let key = AccountKey::generate_ec().unwrap();
        let jws = Jws::new_post_as_get(&key, Some("kid"), "url", "bm9uY2U").unwrap();
        let header = decode_json(&jws.protected);
        assert_eq!(header["alg"], "ES256");
        assert_eq!(b64u::decode(&jws.signature).unwrap().len(), 64);
    }
}
