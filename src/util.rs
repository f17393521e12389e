//! Certificate utility methods for convenience (such as CSR generation).

use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::x509::{self, X509Builder, X509Name, X509Req};

use crate::Error;

/// Generate a 2048 bit RSA key for a certificate, as PEM formatted PKCS#8.
pub fn generate_domain_key() -> Result<Vec<u8>, Error> {
    let key = Rsa::generate(2048)
        .and_then(PKey::from_rsa)
        .map_err(|err| Error::Ssl("failed to generate RSA key", err))?;
    key.private_key_to_pem_pkcs8()
        .map_err(|err| Error::Ssl("failed to format private key as PEM pkcs8", err))
}

/// Generate a PEM formatted CSR for a list of domains, signed with the
/// given PEM formatted private key.
///
/// The first identifier becomes the subject CN; all of them are listed as
/// subject alternative names.
pub fn generate_csr(
    identifiers: &[impl AsRef<str>],
    private_key_pem: &[u8],
) -> Result<Vec<u8>, Error> {
    if identifiers.is_empty() {
        return Err(Error::Csr("cannot generate empty CSR".to_string()));
    }

    let private_key = PKey::private_key_from_pem(private_key_pem)
        .map_err(|err| Error::Ssl("failed to parse private key PEM", err))?;

    let mut name = X509Name::builder()?;
    name.append_entry_by_nid(Nid::COMMONNAME, identifiers[0].as_ref())?;
    let name = name.build();

    let mut csr = X509Req::builder()?;
    csr.set_subject_name(&name)?;
    csr.set_pubkey(&private_key)?;

    let context = csr.x509v3_context(None);
    let mut ext = openssl::stack::Stack::new()?;
    ext.push(x509::extension::BasicConstraints::new().build()?)?;
    ext.push(
        x509::extension::KeyUsage::new()
            .digital_signature()
            .key_encipherment()
            .build()?,
    )?;
    ext.push(
        x509::extension::ExtendedKeyUsage::new()
            .server_auth()
            .client_auth()
            .build()?,
    )?;
    let mut san = x509::extension::SubjectAlternativeName::new();
    for dns in identifiers {
        san.dns(dns.as_ref());
    }
    ext.push(san.build(&context)?)?;
    csr.add_extensions(&ext)?;

    csr.sign(&private_key, MessageDigest::sha256())?;

    Ok(csr.build().to_pem()?)
}

/// Convert a PEM formatted CSR to DER, the encoding finalization requests
/// embed.
pub fn csr_to_der(csr_pem: &[u8]) -> Result<Vec<u8>, Error> {
    let csr = X509Req::from_pem(csr_pem)
        .map_err(|err| Error::Ssl("failed to parse CSR PEM", err))?;
    Ok(csr.to_der()?)
}

/// Issue a self-signed certificate from a CSR, as a placeholder until the
/// real certificate arrives.
///
/// The subject and public key are taken from the CSR, which must match the
/// given PEM formatted signing key.
pub fn self_signed_certificate(
    csr_pem: &[u8],
    private_key_pem: &[u8],
    validity_days: u32,
) -> Result<Vec<u8>, Error> {
    let csr = X509Req::from_pem(csr_pem)
        .map_err(|err| Error::Ssl("failed to parse CSR PEM", err))?;
    let private_key = PKey::private_key_from_pem(private_key_pem)
        .map_err(|err| Error::Ssl("failed to parse private key PEM", err))?;

    let mut builder = X509Builder::new()?;
    builder.set_version(2)?;

    // reused serial numbers upset browsers
    let mut serial = BigNum::new()?;
    serial.rand(159, MsbOption::MAYBE_ZERO, false)?;
    let serial_asn1 = serial.to_asn1_integer()?;
    builder.set_serial_number(&serial_asn1)?;

    builder.set_subject_name(csr.subject_name())?;
    builder.set_issuer_name(csr.subject_name())?;
    let csr_pubkey = csr.public_key()?;
    builder.set_pubkey(&csr_pubkey)?;

    let not_before = openssl::asn1::Asn1Time::days_from_now(0)?;
    builder.set_not_before(&not_before)?;
    let not_after = openssl::asn1::Asn1Time::days_from_now(validity_days)?;
    builder.set_not_after(&not_after)?;

    builder.append_extension(x509::extension::BasicConstraints::new().build()?)?;
    builder.append_extension(
        x509::extension::ExtendedKeyUsage::new()
            .server_auth()
            .build()?,
    )?;

    let context = builder.x509v3_context(None, None);
    let ext = x509::extension::SubjectKeyIdentifier::new().build(&context)?;
    builder.append_extension(ext)?;

    builder.sign(&private_key, MessageDigest::sha256())?;

    Ok(builder.build().to_pem()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_parses_back() {
        let pem = generate_domain_key().unwrap();
        let key = PKey::private_key_from_pem(&pem).unwrap();
        assert_eq!(key.rsa().unwrap().size(), 256);
    }

    #[test]
    fn csr_carries_cn_and_san() {
        let key = generate_domain_key().unwrap();
        let pem = generate_csr(&["example.com", "sub.example.com"], &key).unwrap();
        assert!(pem.starts_with(b"-----BEGIN CERTIFICATE REQUEST-----"));

        let csr = X509Req::from_pem(&pem).unwrap();
        let cn = csr
            .subject_name()
            .entries_by_nid(Nid::COMMONNAME)
            .next()
            .unwrap();
        assert_eq!(cn.data().as_slice(), b"example.com");
        assert!(csr.verify(&csr.public_key().unwrap()).unwrap());
    }

    #[test]
    fn empty_identifier_list_is_rejected() {
        let key = generate_domain_key().unwrap();
        let err = generate_csr(&[] as &[&str], &key).unwrap_err();
        assert!(matches!(err, Error::Csr(_)));
    }

    #[test]
    fn csr_der_conversion_round_trips() {
        let key = generate_domain_key().unwrap();
        let pem = generate_csr(&["example.com"], &key).unwrap();
        let der = csr_to_der(&pem).unwrap();
        assert_eq!(X509Req::from_der(&der).unwrap().to_pem().unwrap(), pem);
    }

    #[test]
    fn self_signed_certificate_matches_the_csr() {
        let key = generate_domain_key().unwrap();
        let csr = generate_csr(&["example.com"], &key).unwrap();
        let cert_pem = self_signed_certificate(&csr, &key, 30).unwrap();
        assert!(cert_pem.starts_with(b"-----BEGIN CERTIFICATE-----"));

        let cert = openssl::x509::X509::from_pem(&cert_pem).unwrap();
        let cn = cert
            .subject_name()
            .entries_by_nid(Nid::COMMONNAME)
            .next()
            .unwrap();
        assert_eq!(cn.data().as_slice(), b"example.com");
        // self-signed: verifies under its own public key
        assert!(cert.verify(&cert.public_key().unwrap()).unwrap());
    }
}
