//! The challenge fulfillment extension point.

use async_trait::async_trait;

use crate::authorization::Challenge;
use crate::Error;

/// The `http-01` challenge type.
pub const HTTP_01: &str = "http-01";

/// The `dns-01` challenge type.
pub const DNS_01: &str = "dns-01";

/// The `tls-alpn-01` challenge type.
pub const TLS_ALPN_01: &str = "tls-alpn-01";

/// Installs and removes challenge proofs using out-of-band mechanisms (file
/// writes, DNS APIs, TLS server reconfiguration).
///
/// Every method has a default: `fulfill_*` declines with `Ok(false)` and
/// `clear_*` is a no-op, so a solver only implements the pairs it actually
/// supports. During [`sign`](crate::AcmeClient::sign) the client walks an
/// authorization's challenges in server order and settles on the first one a
/// solver claims to have fulfilled; the matching `clear_*` runs after that
/// authorization validates.
///
/// `Ok(false)` means "not supported, try the next challenge"; a solver whose
/// external call failed should return [`Error::FulfillmentFailed`] instead.
#[allow(unused_variables)]
#[async_trait]
pub trait ChallengeSolver: Send + Sync {
    /// Install the proof for an `http-01` challenge.
    ///
    /// `key_authorization` is the exact byte string to serve at
    /// `http://<domain>/.well-known/acme-challenge/<token>`.
    async fn fulfill_http_01(
        &self,
        domain: &str,
        challenge: &Challenge,
        key_authorization: &str,
    ) -> Result<bool, Error> {
        Ok(false)
    }

    /// Undo [`fulfill_http_01`](ChallengeSolver::fulfill_http_01).
    async fn clear_http_01(&self, domain: &str, challenge: &Challenge) -> Result<(), Error> {
        Ok(())
    }

    /// Install the proof for a `dns-01` challenge.
    ///
    /// `txt_value` is the exact value to publish as a TXT record at
    /// `_acme-challenge.<domain>`.
    async fn fulfill_dns_01(
        &self,
        domain: &str,
        challenge: &Challenge,
        txt_value: &str,
    ) -> Result<bool, Error> {
        Ok(false)
    }

    /// Undo [`fulfill_dns_01`](ChallengeSolver::fulfill_dns_01).
    async fn clear_dns_01(&self, domain: &str, challenge: &Challenge) -> Result<(), Error> {
        Ok(())
    }

    /// Install the proof for a `tls-alpn-01` challenge.
    ///
    /// `key_authorization` is the value the validation certificate's
    /// `acmeIdentifier` extension is derived from; how it is served is
    /// entirely up to the solver.
    async fn fulfill_tls_alpn_01(
        &self,
        domain: &str,
        challenge: &Challenge,
        key_authorization: &str,
    ) -> Result<bool, Error> {
        Ok(false)
    }

    /// Undo [`fulfill_tls_alpn_01`](ChallengeSolver::fulfill_tls_alpn_01).
    async fn clear_tls_alpn_01(&self, domain: &str, challenge: &Challenge) -> Result<(), Error> {
        Ok(())
    }
}

/// The default solver: declines every challenge.
///
/// A client using it can manage accounts and place orders, but
/// [`sign`](crate::AcmeClient::sign) will fail with
/// [`Error::FulfillmentFailed`].
pub struct NullSolver;

#[async_trait]
impl ChallengeSolver for NullSolver {}
