//! The ACME client: request engine, account lifecycle and the
//! order/authorization/challenge state machine.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::authorization::{Authorization, Challenge, Status as AuthorizationStatus};
use crate::directory::Directory;
use crate::eab::{ExternalAccountBinding, ExternalAccountKey};
use crate::jws::Jws;
use crate::key::AccountKey;
use crate::nonce::NoncePool;
use crate::order::{Identifier, Order, OrderAuthorization, OrderData, Status as OrderStatus};
use crate::solver::{self, ChallengeSolver, NullSolver};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use crate::util;
use crate::{b64u, error, Error};

/// Default timeout for a single network round trip.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(40);

/// Wall-clock deadline for an authorization to become valid.
const AUTHORIZATION_DEADLINE: Duration = Duration::from_secs(60);

/// Wall-clock deadline for finalization plus certificate download.
const FINALIZE_DEADLINE: Duration = Duration::from_secs(60);

/// Upper bound of the jittered delay between authorization polls, seconds.
const AUTHORIZATION_POLL_LIMIT: f64 = 3.0;

/// Upper bound of the jittered delay between order polls, seconds.
const ORDER_POLL_LIMIT: f64 = 1.0;

/// An ACME (RFC 8555) client.
///
/// The client is *unbound* until an account URL is known, either from
/// [`new_account`](AcmeClient::new_account) or from configuration; only a
/// *bound* client can place orders. [`sign`](AcmeClient::sign) runs the
/// whole issuance sequence, delegating proof installation to the configured
/// [`ChallengeSolver`].
///
/// ```no_run
/// # async fn example() -> Result<(), acme_courier::Error> {
/// use acme_courier::{AccountKey, AcmeClient};
///
/// let key = AccountKey::generate_rsa()?;
/// let mut client = AcmeClient::builder("https://ca.example/directory", key).build()?;
/// let account_url = client.new_account(vec!["admin@example.org".to_string()], None).await?;
/// # let _ = account_url; Ok(())
/// # }
/// ```
pub struct AcmeClient {
    directory_url: String,
    key: AccountKey,
    account_url: Option<String>,
    directory: Option<Directory>,
    nonces: NoncePool,
    timeout: Duration,
    transport: Arc<dyn HttpTransport>,
    solver: Box<dyn ChallengeSolver>,
}

/// Configuration collected before an [`AcmeClient`] is built.
///
/// Obtained from [`AcmeClient::builder`] or [`AcmeClient::from_state`].
pub struct AcmeClientBuilder {
    directory_url: String,
    key: AccountKey,
    account_url: Option<String>,
    timeout: Duration,
    user_agent: Option<String>,
    transport: Option<Arc<dyn HttpTransport>>,
    solver: Option<Box<dyn ChallengeSolver>>,
}

impl AcmeClientBuilder {
    /// Pre-bind the client to an existing account URL.
    pub fn account_url(mut self, url: impl Into<String>) -> Self {
        self.account_url = Some(url.into());
        self
    }

    /// Override the per-request network timeout (default 40 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the `User-Agent` sent by the default transport.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Use a custom [`HttpTransport`] instead of the reqwest default.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Install the [`ChallengeSolver`] consulted by
    /// [`sign`](AcmeClient::sign). Defaults to [`NullSolver`].
    pub fn solver(mut self, solver: Box<dyn ChallengeSolver>) -> Self {
        self.solver = Some(solver);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<AcmeClient, Error> {
        let user_agent = self.user_agent.unwrap_or_else(|| {
            format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
        });
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&user_agent)?),
        };
        Ok(AcmeClient {
            directory_url: self.directory_url,
            key: self.key,
            account_url: self.account_url,
            directory: None,
            nonces: NoncePool::new(),
            timeout: self.timeout,
            transport,
            solver: self.solver.unwrap_or_else(|| Box::new(NullSolver)),
        })
    }
}

/// The serialized client state, see [`AcmeClient::to_state`].
#[derive(Deserialize, Serialize)]
struct ClientState {
    directory: String,
    key: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    account_url: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewAccountRequest {
    terms_of_service_agreed: bool,
    contact: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_account_binding: Option<ExternalAccountBinding>,
}

#[derive(Serialize)]
struct NewOrderRequest {
    identifiers: Vec<Identifier>,
}

impl AcmeClient {
    /// Start configuring a client for the given directory URL and account
    /// key.
    pub fn builder(directory_url: impl Into<String>, key: AccountKey) -> AcmeClientBuilder {
        AcmeClientBuilder {
            directory_url: directory_url.into(),
            key,
            account_url: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            transport: None,
            solver: None,
        }
    }

    /// The configured directory URL, without fetching anything.
    pub fn directory_url(&self) -> &str {
        &self.directory_url
    }

    /// The account URL, if the client is bound.
    pub fn account_url(&self) -> Option<&str> {
        self.account_url.as_deref()
    }

    /// Whether the client is bound to an account.
    pub fn is_bound(&self) -> bool {
        self.account_url.is_some()
    }

    /// The account key.
    pub fn key(&self) -> &AccountKey {
        &self.key
    }

    /// Shortcut to [`AccountKey::key_authorization`].
    pub fn key_authorization(&self, token: &str) -> Result<String, Error> {
        self.key.key_authorization(token)
    }

    /// Shortcut to [`AccountKey::dns_01_txt_value`].
    pub fn dns_01_txt_value(&self, token: &str) -> Result<String, Error> {
        self.key.dns_01_txt_value(token)
    }

    fn check_bound(&self) -> Result<(), Error> {
        if self.is_bound() {
            Ok(())
        } else {
            Err(Error::NotRegistered)
        }
    }

    fn check_unbound(&self) -> Result<(), Error> {
        if self.is_bound() {
            Err(Error::AlreadyRegistered)
        } else {
            Ok(())
        }
    }

    fn bound_account_url(&self) -> Result<String, Error> {
        self.account_url.clone().ok_or(Error::NotRegistered)
    }

    /// Export the client state: directory URL, private account key and the
    /// account URL if bound.
    ///
    /// The blob is self-describing JSON, but callers should treat it as
    /// opaque; it contains the *private* key. Feed it back through
    /// [`from_state`](AcmeClient::from_state).
    pub fn to_state(&self) -> Result<Vec<u8>, Error> {
        Ok(serde_json::to_vec(&ClientState {
            directory: self.directory_url.clone(),
            key: self.key.to_private_jwk()?,
            account_url: self.account_url.clone(),
        })?)
    }

    /// Rebuild a client from a [`to_state`](AcmeClient::to_state) blob.
    ///
    /// Returns the builder so transport, solver and timeout can still be
    /// configured before [`build`](AcmeClientBuilder::build).
    pub fn from_state(state: &[u8]) -> Result<AcmeClientBuilder, Error> {
        let state: ClientState = serde_json::from_slice(state)?;
        let key = AccountKey::from_private_jwk(&state.key)?;
        let mut builder = AcmeClient::builder(state.directory, key);
        if let Some(url) = state.account_url {
            builder = builder.account_url(url);
        }
        Ok(builder)
    }

    /// Get the directory information.
    ///
    /// Fetched lazily on first use and cached for the lifetime of the
    /// client.
    pub async fn directory(&mut self) -> Result<&Directory, Error> {
        if self.directory.is_none() {
            info!(url = %self.directory_url, "fetching ACME directory");
            let request = HttpRequest::get(&self.directory_url, self.timeout);
            let response = self.transport.request(request).await?;
            let response = classify(response)?;
            self.directory = Some(response.json()?);
        }
        // the cache was just filled above
        Ok(self.directory.as_ref().unwrap())
    }

    /// Register a new account (RFC 8555 section 7.3) and bind the client to
    /// it.
    ///
    /// `emails` become `mailto:` contacts. When the directory announces
    /// `externalAccountRequired`, `external` credentials must be supplied.
    /// Returns the account URL; persist it (or the whole
    /// [`to_state`](AcmeClient::to_state) blob) to reuse the account later.
    pub async fn new_account<I>(
        &mut self,
        emails: I,
        external: Option<&ExternalAccountKey>,
    ) -> Result<String, Error>
    where
        I: IntoIterator<Item = String>,
    {
        let contact: Vec<String> = emails
            .into_iter()
            .map(|email| format!("mailto:{}", email))
            .collect();
        info!(?contact, "creating new account");
        self.check_unbound()?;

        let directory = self.directory().await?.clone();
        if directory.external_account_required() && external.is_none() {
            return Err(Error::ExternalAccountRequired);
        }
        let external_account_binding = match external {
            Some(eab) => Some(eab.binding(&self.key.public_jwk()?, &directory.new_account)?),
            None => None,
        };

        let payload = serde_json::to_value(NewAccountRequest {
            terms_of_service_agreed: true,
            contact,
            external_account_binding,
        })?;
        let response = self.post(&directory.new_account, Some(&payload)).await?;

        let account_url = response.location_required()?;
        info!(%account_url, "account registered");
        self.account_url = Some(account_url.clone());
        Ok(account_url)
    }

    /// Deactivate the bound account (RFC 8555 section 7.3.6) and unbind the
    /// client.
    pub async fn deactivate_account(&mut self) -> Result<(), Error> {
        let account_url = self.bound_account_url()?;
        info!(%account_url, "deactivating account");
        self.post(&account_url, Some(&serde_json::json!({"status": "deactivated"})))
            .await?;
        self.account_url = None;
        Ok(())
    }

    /// Create a new order (RFC 8555 section 7.4) for a set of domains.
    ///
    /// The returned [`Order`] pairs every domain with its authorization URL
    /// in server order and carries the finalize and order URLs.
    pub async fn new_order<I>(&mut self, domains: I) -> Result<Order, Error>
    where
        I: IntoIterator<Item = String>,
    {
        let identifiers: Vec<Identifier> = domains.into_iter().map(Identifier::Dns).collect();
        if identifiers.is_empty() {
            return Err(Error::EmptyOrder);
        }
        info!(
            domains = ?identifiers.iter().map(Identifier::value).collect::<Vec<_>>(),
            "creating new order"
        );
        self.check_bound()?;

        let new_order_url = self.directory().await?.new_order.clone();
        let payload = serde_json::to_value(NewOrderRequest {
            identifiers: identifiers.clone(),
        })?;
        let response = self.post(&new_order_url, Some(&payload)).await?;

        let location = response.location_required()?;
        let data: OrderData = response.json()?;
        let finalize = data
            .finalize
            .ok_or_else(|| Error::InvalidApi("order without 'finalize' URL".to_string()))?;
        if data.authorizations.len() != identifiers.len() {
            return Err(Error::InvalidApi(
                "authorization count does not match identifiers".to_string(),
            ));
        }
        let authorizations = identifiers
            .into_iter()
            .zip(data.authorizations)
            .map(|(identifier, url)| {
                let Identifier::Dns(domain) = identifier;
                OrderAuthorization { domain, url }
            })
            .collect();

        Ok(Order {
            location,
            authorizations,
            finalize,
        })
    }

    /// Fetch the challenges of an authorization (RFC 8555 section 7.5).
    pub async fn get_challenges(
        &mut self,
        authorization: &OrderAuthorization,
    ) -> Result<Vec<Challenge>, Error> {
        info!(domain = %authorization.domain, "fetching challenges");
        self.check_bound()?;
        let response = self.post(&authorization.url, None).await?;
        let authorization: Authorization = response.json()?;
        Ok(authorization.challenges)
    }

    /// Tell the server a challenge's proof is in place and ready to be
    /// validated.
    pub async fn respond_challenge(&mut self, challenge: &Challenge) -> Result<(), Error> {
        info!(challenge = %challenge.ty, url = %challenge.url, "responding to challenge");
        self.check_bound()?;
        self.post(&challenge.url, Some(&Value::Object(Default::default())))
            .await?;
        Ok(())
    }

    /// Poll an authorization until it becomes valid.
    ///
    /// Polls with a jittered delay and gives up after 60 seconds with
    /// [`Error::Timeout`]. Any terminal status other than `valid` is an
    /// [`Error::Authorization`].
    pub async fn wait_for_authorization(
        &mut self,
        authorization: &OrderAuthorization,
    ) -> Result<(), Error> {
        self.check_bound()?;
        let poll = async {
            loop {
                debug!(domain = %authorization.domain, "polling authorization");
                let response = self.post(&authorization.url, None).await?;
                let state: Authorization = response.json()?;
                info!(
                    domain = %authorization.domain,
                    status = state.status.as_str(),
                    "authorization status"
                );
                match state.status {
                    AuthorizationStatus::Valid => return Ok(()),
                    AuthorizationStatus::Pending => random_delay(AUTHORIZATION_POLL_LIMIT).await,
                    other => return Err(Error::Authorization(other.as_str().to_string())),
                }
            }
        };
        tokio::time::timeout(AUTHORIZATION_DEADLINE, poll)
            .await
            .map_err(|_| Error::Timeout)?
    }

    /// Finalize an order with a PEM formatted CSR and download the issued
    /// certificate chain (PEM).
    ///
    /// Bounded by a 60 second deadline; an order turning `invalid` is an
    /// [`Error::Certificate`].
    pub async fn finalize_and_wait(
        &mut self,
        order: &Order,
        csr_pem: &[u8],
    ) -> Result<String, Error> {
        info!(order = %order.location, "finalizing order");
        self.check_bound()?;
        let csr = b64u::encode(&util::csr_to_der(csr_pem)?);

        let work = async {
            let response = self
                .post(&order.finalize, Some(&serde_json::json!({ "csr": csr })))
                .await?;
            let data: OrderData = response.json()?;
            if data.status.is_invalid() {
                return Err(Error::Certificate(
                    "server refused to finalize the order".to_string(),
                ));
            }
            // some CAs omit Location here; the order URL from creation works
            let order_url = response
                .location()
                .map(str::to_owned)
                .unwrap_or_else(|| order.location.clone());

            loop {
                random_delay(ORDER_POLL_LIMIT).await;
                debug!(order = %order_url, "polling order");
                let response = self.post(&order_url, None).await?;
                let data: OrderData = response.json()?;
                match data.status {
                    OrderStatus::Invalid => {
                        return Err(Error::Certificate("order became invalid".to_string()))
                    }
                    OrderStatus::Valid => {
                        let certificate_url = data.certificate.ok_or_else(|| {
                            Error::InvalidApi("valid order without certificate URL".to_string())
                        })?;
                        info!("order is ready, downloading certificate");
                        let response = self.post(&certificate_url, None).await?;
                        return String::from_utf8(response.body.to_vec()).map_err(|_| {
                            Error::InvalidApi("certificate is not valid utf-8".to_string())
                        });
                    }
                    _ => {}
                }
            }
        };
        tokio::time::timeout(FINALIZE_DEADLINE, work)
            .await
            .map_err(|_| Error::Timeout)?
    }

    /// Obtain a certificate for a set of domains: the full RFC 8555
    /// sequence from order creation to certificate download.
    ///
    /// For every authorization the server returns, the challenges are
    /// offered to the configured [`ChallengeSolver`] in server order; the
    /// first one it fulfills is responded to and polled until valid, then
    /// the solver's `clear_*` hook runs. Finally the CSR is submitted and
    /// the certificate chain is returned as PEM.
    pub async fn sign<I>(&mut self, domains: I, csr_pem: &[u8]) -> Result<String, Error>
    where
        I: IntoIterator<Item = String>,
    {
        self.check_bound()?;
        let order = self.new_order(domains).await?;

        for authorization in &order.authorizations {
            info!(domain = %authorization.domain, "processing authorization");
            let challenges = self.get_challenges(authorization).await?;

            let mut fulfilled = None;
            for challenge in &challenges {
                if self
                    .fulfill_challenge(&authorization.domain, challenge)
                    .await?
                {
                    self.respond_challenge(challenge).await?;
                    fulfilled = Some(challenge);
                    break;
                }
            }
            let challenge = fulfilled.ok_or_else(|| {
                Error::FulfillmentFailed(format!(
                    "no challenge of {} could be fulfilled",
                    authorization.domain
                ))
            })?;

            self.wait_for_authorization(authorization).await?;
            self.clear_challenge(&authorization.domain, challenge).await?;
        }

        self.finalize_and_wait(&order, csr_pem).await
    }

    /// Route a challenge to the solver hook for its type.
    ///
    /// Returns whether the proof was installed; unknown challenge types are
    /// declined without consulting the solver.
    pub async fn fulfill_challenge(
        &self,
        domain: &str,
        challenge: &Challenge,
    ) -> Result<bool, Error> {
        let fulfilled = match challenge.ty.as_str() {
            solver::HTTP_01 => {
                let key_authorization = self.key.key_authorization(&challenge.token)?;
                self.solver
                    .fulfill_http_01(domain, challenge, &key_authorization)
                    .await?
            }
            solver::DNS_01 => {
                let txt_value = self.key.dns_01_txt_value(&challenge.token)?;
                self.solver
                    .fulfill_dns_01(domain, challenge, &txt_value)
                    .await?
            }
            solver::TLS_ALPN_01 => {
                let key_authorization = self.key.key_authorization(&challenge.token)?;
                self.solver
                    .fulfill_tls_alpn_01(domain, challenge, &key_authorization)
                    .await?
            }
            _ => false,
        };
        if fulfilled {
            info!(challenge = %challenge.ty, domain, "challenge fulfilled");
        } else {
            info!(challenge = %challenge.ty, domain, "skipping challenge");
        }
        Ok(fulfilled)
    }

    /// Run the solver's cleanup hook for a validated challenge.
    pub async fn clear_challenge(&self, domain: &str, challenge: &Challenge) -> Result<(), Error> {
        info!(challenge = %challenge.ty, domain, "clearing challenge");
        match challenge.ty.as_str() {
            solver::HTTP_01 => self.solver.clear_http_01(domain, challenge).await,
            solver::DNS_01 => self.solver.clear_dns_01(domain, challenge).await,
            solver::TLS_ALPN_01 => self.solver.clear_tls_alpn_01(domain, challenge).await,
            _ => Ok(()),
        }
    }

    /// Perform a signed POST. `payload` of `None` sends the empty
    /// "POST-as-GET" payload.
    ///
    /// A `badNonce` rejection is retried exactly once with a freshly
    /// acquired nonce; every other error propagates.
    async fn post(&mut self, url: &str, payload: Option<&Value>) -> Result<HttpResponse, Error> {
        match self.post_once(url, payload).await {
            Err(err) if err.is_bad_nonce() => {
                debug!(url, "retrying POST with a fresh nonce");
                self.post_once(url, payload).await
            }
            other => other,
        }
    }

    async fn post_once(
        &mut self,
        url: &str,
        payload: Option<&Value>,
    ) -> Result<HttpResponse, Error> {
        let nonce = b64u::encode(&self.take_nonce(url).await?);
        let kid = self.account_url.clone();
        let jws = match payload {
            Some(payload) => Jws::new(&self.key, kid.as_deref(), url, &nonce, payload)?,
            None => Jws::new_post_as_get(&self.key, kid.as_deref(), url, &nonce)?,
        };

        debug!(url, "POST");
        let request = HttpRequest::post(
            url,
            serde_json::to_string(&jws)?,
            crate::JOSE_CONTENT_TYPE,
            self.timeout,
        );
        let response = self.transport.request(request).await?;
        let response = classify(response)?;
        self.nonces.harvest(&response.headers)?;
        Ok(response)
    }

    /// Perform a HEAD request, harvesting any nonce it returns.
    async fn head(&mut self, url: &str) -> Result<HttpResponse, Error> {
        debug!(url, "HEAD");
        let response = self
            .transport
            .request(HttpRequest::head(url, self.timeout))
            .await?;
        let response = classify(response)?;
        self.nonces.harvest(&response.headers)?;
        Ok(response)
    }

    /// Take a nonce from the pool, replenishing it first when empty.
    ///
    /// Replenishment uses the directory's `newNonce` URL, or `fallback_url`
    /// for directories without one.
    async fn take_nonce(&mut self, fallback_url: &str) -> Result<Vec<u8>, Error> {
        if self.nonces.is_empty() {
            let nonce_url = match &self.directory().await?.new_nonce {
                Some(url) => url.clone(),
                None => fallback_url.to_string(),
            };
            debug!(url = %nonce_url, "fetching a fresh nonce");
            self.head(&nonce_url).await?;
        }
        self.nonces
            .take()
            .ok_or_else(|| Error::InvalidApi("no nonce received from server".to_string()))
    }
}

/// Map a response to the error taxonomy.
///
/// Anything below 400 passes through; everything else must be an RFC 7807
/// problem document whose `type` selects the error.
pub(crate) fn classify(response: HttpResponse) -> Result<HttpResponse, Error> {
    if response.status.as_u16() < 400 {
        return Ok(response);
    }
    let problem: error::ErrorResponse = match serde_json::from_slice(&response.body) {
        Ok(problem) => problem,
        Err(err) => return Err(Error::Undecodable(err.to_string())),
    };
    Err(match problem.ty.as_str() {
        error::BAD_NONCE => Error::BadNonce,
        error::RATE_LIMITED => Error::RateLimited,
        error::UNAUTHORIZED => Error::Unauthorized,
        error::EXTERNAL_ACCOUNT_REQUIRED => Error::ExternalAccountRequired,
        _ => Error::Api {
            status: response.status.as_u16(),
            problem,
        },
    })
}

/// Sleep for a random duration in `[limit / 2, limit]` seconds.
async fn random_delay(limit: f64) {
    let jitter: f64 = rand::random();
    tokio::time::sleep(Duration::from_secs_f64(limit / 2.0 * (1.0 + jitter))).await;
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::{HeaderMap, StatusCode};

    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
            body: Bytes::copy_from_slice(body.as_bytes()),
        }
    }

    fn test_client() -> AcmeClient {
        AcmeClient::builder(
            "https://ca.example/directory",
            AccountKey::generate_rsa().unwrap(),
        )
        .build()
        .unwrap()
    }

    #[test]
    fn classifier_passes_success_through() {
        assert!(classify(response(201, "{}")).is_ok());
        assert!(classify(response(200, "")).is_ok());
    }

    #[test]
    fn classifier_maps_known_problem_types() {
        let err = classify(response(
            400,
            r#"{"type": "urn:ietf:params:acme:error:badNonce"}"#,
        ))
        .unwrap_err();
        assert!(err.is_bad_nonce());

        let err = classify(response(
            429,
            r#"{"type": "urn:ietf:params:acme:error:rateLimited"}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, Error::RateLimited));

        let err = classify(response(
            403,
            r#"{"type": "urn:ietf:params:acme:error:unauthorized"}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, Error::Unauthorized));

        let err = classify(response(
            403,
            r#"{"type": "urn:ietf:params:acme:error:externalAccountRequired"}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, Error::ExternalAccountRequired));
    }

    #[test]
    fn classifier_keeps_status_and_detail_for_other_errors() {
        let err = classify(response(
            409,
            r#"{"type": "urn:ietf:params:acme:error:malformed", "detail": "nope"}"#,
        ))
        .unwrap_err();
        match err {
            Error::Api { status, problem } => {
                assert_eq!(status, 409);
                assert_eq!(problem.ty, "urn:ietf:params:acme:error:malformed");
                assert_eq!(problem.detail.as_deref(), Some("nope"));
            }
            other => panic!("expected Api error, got {}", other),
        }
    }

    #[test]
    fn classifier_flags_unparsable_error_bodies() {
        let err = classify(response(500, "<html>oops</html>")).unwrap_err();
        assert!(matches!(err, Error::Undecodable(_)));
    }

    #[tokio::test]
    async fn new_account_on_a_bound_client_fails_fast() {
        let mut client = test_client();
        client.account_url = Some("https://ca.example/acct/1".to_string());
        let err = client
            .new_account(vec!["admin@example.org".to_string()], None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyRegistered));
    }

    #[tokio::test]
    async fn operations_on_an_unbound_client_fail_fast() {
        let mut client = test_client();
        assert!(!client.is_bound());
        let err = client
            .new_order(vec!["example.com".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotRegistered));
        let err = client.deactivate_account().await.unwrap_err();
        assert!(matches!(err, Error::NotRegistered));
    }

    #[tokio::test]
    async fn ordering_nothing_is_an_error() {
        let mut client = test_client();
        client.account_url = Some("https://ca.example/acct/1".to_string());
        let err = client.new_order(Vec::new()).await.unwrap_err();
        assert!(matches!(err, Error::EmptyOrder));
    }

    #[test]
    fn state_round_trips_including_the_bind_state() {
        let unbound = test_client();
        let state = unbound.to_state().unwrap();
        let restored = AcmeClient::from_state(&state).unwrap().build().unwrap();
        assert_eq!(restored.directory_url(), unbound.directory_url());
        assert_eq!(restored.account_url(), None);
        assert_eq!(
            restored.key().to_private_jwk().unwrap(),
            unbound.key().to_private_jwk().unwrap()
        );

        let mut bound = test_client();
        bound.account_url = Some("https://ca.example/acct/42".to_string());
        let state = bound.to_state().unwrap();
        let restored = AcmeClient::from_state(&state).unwrap().build().unwrap();
        assert_eq!(restored.account_url(), Some("https://ca.example/acct/42"));
        assert!(restored.is_bound());
    }
}
