//! Account key handling: JWK representations, RFC 7638 thumbprints and the
//! key authorization values challenges are built from.

use std::convert::TryFrom;

use openssl::bn::{BigNum, BigNumContext};
use openssl::ec::{EcGroup, EcKey, EcPoint};
use openssl::nid::Nid;
use openssl::pkey::{HasPublic, Id, PKey, PKeyRef, Private};
use openssl::rsa::Rsa;
use serde::Serialize;
use serde_json::Value;

use crate::b64u;
use crate::Error;

/// Size of the P-256 field elements in bytes.
const P256_FIELD_BYTES: i32 = 32;

/// An RSA public key.
#[derive(Clone, Debug, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RsaPublicKey {
    #[serde(with = "b64u::bytes")]
    e: Vec<u8>,
    #[serde(with = "b64u::bytes")]
    n: Vec<u8>,
}

/// An EC public key.
#[derive(Clone, Debug, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EcPublicKey {
    crv: &'static str,
    #[serde(with = "b64u::bytes")]
    x: Vec<u8>,
    #[serde(with = "b64u::bytes")]
    y: Vec<u8>,
}

/// A public key.
///
/// Internally tagged, so this already contains the 'kty' member.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kty")]
pub enum PublicKey {
    /// An RSA key, signed with RS256.
    #[serde(rename = "RSA")]
    Rsa(RsaPublicKey),
    /// A P-256 EC key, signed with ES256.
    #[serde(rename = "EC")]
    Ec(EcPublicKey),
}

impl PublicKey {
    /// The JWS signature algorithm this key signs with.
    pub fn alg(&self) -> &'static str {
        match self {
            PublicKey::Rsa(_) => "RS256",
            PublicKey::Ec(_) => "ES256",
        }
    }

    /// The RFC 7638 thumbprint: the b64u encoded sha256 digest of the
    /// required JWK members in lexicographic order, without whitespace.
    pub fn thumbprint(&self) -> Result<String, Error> {
        let canonical = match self {
            PublicKey::Rsa(key) => format!(
                r#"{{"e":"{}","kty":"RSA","n":"{}"}}"#,
                b64u::encode(&key.e),
                b64u::encode(&key.n),
            ),
            PublicKey::Ec(key) => format!(
                r#"{{"crv":"{}","kty":"EC","x":"{}","y":"{}"}}"#,
                key.crv,
                b64u::encode(&key.x),
                b64u::encode(&key.y),
            ),
        };
        Ok(b64u::encode(&openssl::sha::sha256(canonical.as_bytes())))
    }
}

/// A JWK as embedded in the protected header of a first-contact request.
#[derive(Clone, Debug, Serialize)]
pub struct Jwk {
    /// Optional `use` member.
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,

    /// The key data is internally tagged, we can just flatten it.
    #[serde(flatten)]
    pub key: PublicKey,
}

impl<P: HasPublic> TryFrom<&PKeyRef<P>> for Jwk {
    type Error = Error;

    fn try_from(key: &PKeyRef<P>) -> Result<Self, Self::Error> {
        Ok(Self {
            key: PublicKey::try_from(key)?,
            usage: None,
        })
    }
}

impl<P: HasPublic> TryFrom<&PKeyRef<P>> for PublicKey {
    type Error = Error;

    fn try_from(key: &PKeyRef<P>) -> Result<Self, Self::Error> {
        match key.id() {
            Id::RSA => Ok(PublicKey::Rsa(RsaPublicKey::try_from(&key.rsa()?)?)),
            Id::EC => Ok(PublicKey::Ec(EcPublicKey::try_from(&key.ec_key()?)?)),
            _ => Err(Error::UnsupportedKeyType),
        }
    }
}

impl<P: HasPublic> TryFrom<&Rsa<P>> for RsaPublicKey {
    type Error = Error;

    fn try_from(key: &Rsa<P>) -> Result<Self, Self::Error> {
        Ok(RsaPublicKey {
            e: key.e().to_vec(),
            n: key.n().to_vec(),
        })
    }
}

impl<P: HasPublic> TryFrom<&EcKey<P>> for EcPublicKey {
    type Error = Error;

    fn try_from(key: &EcKey<P>) -> Result<Self, Self::Error> {
        let group = key.group();

        if group.curve_name() != Some(Nid::X9_62_PRIME256V1) {
            return Err(Error::UnsupportedGroup);
        }

        let mut ctx = BigNumContext::new()?;
        let mut x = BigNum::new()?;
        let mut y = BigNum::new()?;
        key.public_key()
            .affine_coordinates_gfp(group, &mut x, &mut y, &mut ctx)?;

        Ok(EcPublicKey {
            crv: "P-256",
            x: x.to_vec_padded(P256_FIELD_BYTES)?,
            y: y.to_vec_padded(P256_FIELD_BYTES)?,
        })
    }
}

/// The private key an ACME account signs its requests with.
///
/// RSA keys sign with RS256, P-256 EC keys with ES256; other key types are
/// rejected at construction. The key can be exported to and rebuilt from a
/// private JWK, which is how [`AcmeClient::to_state`](crate::AcmeClient::to_state)
/// persists it.
pub struct AccountKey {
    key: PKey<Private>,
}

impl AccountKey {
    /// Generate a new 2048 bit RSA key with public exponent 65537.
    pub fn generate_rsa() -> Result<Self, Error> {
        let key = Rsa::generate(2048)?;
        Self::from_pkey(PKey::from_rsa(key)?)
    }

    /// Generate a new P-256 EC key.
    pub fn generate_ec() -> Result<Self, Error> {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1)?;
        let key = EcKey::generate(&group)?;
        Self::from_pkey(PKey::from_ec_key(key)?)
    }

    /// Use an existing key. Only RSA and P-256 EC keys are accepted.
    pub fn from_pkey(key: PKey<Private>) -> Result<Self, Error> {
        // rejects unsupported key types and curves up front
        let _ = PublicKey::try_from(&*key)?;
        Ok(Self { key })
    }

    /// The public half as a [`PublicKey`].
    pub fn public_key(&self) -> Result<PublicKey, Error> {
        PublicKey::try_from(&*self.key)
    }

    /// The public half as a [`Jwk`] suitable for a protected header.
    pub fn public_jwk(&self) -> Result<Jwk, Error> {
        Jwk::try_from(&*self.key)
    }

    /// The RFC 7638 thumbprint of the public key.
    pub fn thumbprint(&self) -> Result<String, Error> {
        self.public_key()?.thumbprint()
    }

    /// Get the "key authorization" for a token (RFC 8555 section 8.1).
    pub fn key_authorization(&self, token: &str) -> Result<String, Error> {
        Ok(format!("{}.{}", token, self.thumbprint()?))
    }

    /// Get the TXT field value for a dns-01 token. This is the base64url
    /// encoded sha256 digest of the key authorization value.
    pub fn dns_01_txt_value(&self, token: &str) -> Result<String, Error> {
        let key_authorization = self.key_authorization(token)?;
        let digest = openssl::sha::sha256(key_authorization.as_bytes());
        Ok(b64u::encode(&digest))
    }

    /// Export the key as a private JWK.
    pub fn to_private_jwk(&self) -> Result<Value, Error> {
        match self.key.id() {
            Id::RSA => {
                let rsa = self.key.rsa()?;
                let field = |name: &'static str, num: Option<&openssl::bn::BigNumRef>| {
                    num.map(|n| b64u::encode(&n.to_vec())).ok_or_else(|| {
                        Error::Custom(format!("RSA key is missing the '{}' CRT parameter", name))
                    })
                };
                let p = field("p", rsa.p())?;
                let q = field("q", rsa.q())?;
                let dp = field("dp", rsa.dmp1())?;
                let dq = field("dq", rsa.dmq1())?;
                let qi = field("qi", rsa.iqmp())?;
                Ok(serde_json::json!({
                    "kty": "RSA",
                    "n": b64u::encode(&rsa.n().to_vec()),
                    "e": b64u::encode(&rsa.e().to_vec()),
                    "d": b64u::encode(&rsa.d().to_vec()),
                    "p": p,
                    "q": q,
                    "dp": dp,
                    "dq": dq,
                    "qi": qi,
                }))
            }
            Id::EC => {
                let ec = self.key.ec_key()?;
                let public = EcPublicKey::try_from(&ec)?;
                let d = b64u::encode(&ec.private_key().to_vec_padded(P256_FIELD_BYTES)?);
                Ok(serde_json::json!({
                    "kty": "EC",
                    "crv": public.crv,
                    "x": b64u::encode(&public.x),
                    "y": b64u::encode(&public.y),
                    "d": d,
                }))
            }
            _ => Err(Error::UnsupportedKeyType),
        }
    }

    /// Rebuild a key from a private JWK produced by
    /// [`to_private_jwk`](AccountKey::to_private_jwk).
    pub fn from_private_jwk(jwk: &Value) -> Result<Self, Error> {
        let num = |name: &str| -> Result<BigNum, Error> {
            let data = jwk
                .get(name)
                .and_then(Value::as_str)
                .ok_or_else(|| Error::Custom(format!("private JWK is missing '{}'", name)))?;
            Ok(BigNum::from_slice(&b64u::decode(data)?)?)
        };

        match jwk.get("kty").and_then(Value::as_str) {
            Some("RSA") => {
                let rsa = Rsa::from_private_components(
                    num("n")?,
                    num("e")?,
                    num("d")?,
                    num("p")?,
                    num("q")?,
                    num("dp")?,
                    num("dq")?,
                    num("qi")?,
                )?;
                Self::from_pkey(PKey::from_rsa(rsa)?)
            }
            Some("EC") => {
                if jwk.get("crv").and_then(Value::as_str) != Some("P-256") {
                    return Err(Error::UnsupportedGroup);
                }
                let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1)?;
                let mut ctx = BigNumContext::new()?;
                let mut point = EcPoint::new(&group)?;
                let x = num("x")?;
                let y = num("y")?;
                let d = num("d")?;
                point.set_affine_coordinates_gfp(&group, &x, &y, &mut ctx)?;
                let key = EcKey::from_private_components(&group, &d, &point)?;
                Self::from_pkey(PKey::from_ec_key(key)?)
            }
            Some(_) => Err(Error::UnsupportedKeyType),
            None => Err(Error::Custom("private JWK is missing 'kty'".to_string())),
        }
    }

    pub(crate) fn pkey(&self) -> &PKeyRef<Private> {
        &self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsa_thumbprint_matches_rfc_7638_vector() {
        // the example key from RFC 7638 section 3.1
        let n = b64u::decode(
            "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw",
        )
        .unwrap();
        let e = b64u::decode("AQAB").unwrap();
        let key = PublicKey::Rsa(RsaPublicKey { e, n });
        assert_eq!(
            key.thumbprint().unwrap(),
            "NzbLsXh8uDCcd-6MNwXF4W_7noWXFZAfHkxZsRGC9Xs"
        );
    }

    #[test]
    fn generated_keys_report_their_alg() {
        let rsa = AccountKey::generate_rsa().unwrap();
        assert_eq!(rsa.public_key().unwrap().alg(), "RS256");
        let ec = AccountKey::generate_ec().unwrap();
        assert_eq!(ec.public_key().unwrap().alg(), "ES256");
    }

    #[test]
    fn key_authorization_is_token_dot_thumbprint() {
        let key = AccountKey::generate_rsa().unwrap();
        let ka = key.key_authorization("token-123").unwrap();
        let (token, thumbprint) = ka.split_once('.').unwrap();
        assert_eq!(token, "token-123");
        assert_eq!(thumbprint, key.thumbprint().unwrap());
        // url-safe, unpadded
        assert!(!thumbprint.contains(['+', '/', '=']));
    }

    #[test]
    fn rsa_private_jwk_round_trip() {
        let key = AccountKey::generate_rsa().unwrap();
        let jwk = key.to_private_jwk().unwrap();
        let rebuilt = AccountKey::from_private_jwk(&jwk).unwrap();
        assert_eq!(jwk, rebuilt.to_private_jwk().unwrap());
        assert_eq!(
            key.thumbprint().unwrap(),
            rebuilt.thumbprint().unwrap()
        );
    }

    #[test]
    fn ec_private_jwk_round_trip() {
        let key = AccountKey::generate_ec().unwrap();
        let jwk = key.to_private_jwk().unwrap();
        let rebuilt = AccountKey::from_private_jwk(&jwk).unwrap();
        assert_eq!(jwk, rebuilt.to_private_jwk().unwrap());
        assert_eq!(
            key.thumbprint().unwrap(),
            rebuilt.thumbprint().unwrap()
        );
    }
}
