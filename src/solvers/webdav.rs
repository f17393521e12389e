//! http-01 fulfillment through HTTP PUT/DELETE against the target host.

use async_trait::async_trait;

use crate::authorization::Challenge;
use crate::solver::ChallengeSolver;
use crate::Error;

/// Fulfills `http-01` by uploading the key authorization with an
/// authenticated PUT to
/// `http://<domain>/.well-known/acme-challenge/<token>`, and removing it
/// again with DELETE. Works with WebDAV modules as well as custom upload
/// handlers.
pub struct WebDavSolver {
    username: String,
    password: String,
    client: reqwest::Client,
}

impl WebDavSolver {
    /// Create a solver authenticating with the given basic-auth credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            client: reqwest::Client::new(),
        }
    }

    fn challenge_url(domain: &str, challenge: &Challenge) -> String {
        format!(
            "http://{}/.well-known/acme-challenge/{}",
            domain, challenge.token
        )
    }

    fn check(response: &reqwest::Response) -> Result<(), Error> {
        let status = response.status();
        if status.as_u16() > 299 {
            return Err(Error::FulfillmentFailed(format!(
                "upload endpoint returned status {}",
                status
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ChallengeSolver for WebDavSolver {
    async fn fulfill_http_01(
        &self,
        domain: &str,
        challenge: &Challenge,
        key_authorization: &str,
    ) -> Result<bool, Error> {
        let url = Self::challenge_url(domain, challenge);
        tracing::info!(%url, "uploading http-01 token");
        let response = self
            .client
            .put(&url)
            .basic_auth(&self.username, Some(&self.password))
            .body(key_authorization.to_owned())
            .send()
            .await
            .map_err(|err| Error::FulfillmentFailed(err.to_string()))?;
        Self::check(&response)?;
        Ok(true)
    }

    async fn clear_http_01(&self, domain: &str, challenge: &Challenge) -> Result<(), Error> {
        let url = Self::challenge_url(domain, challenge);
        tracing::info!(%url, "removing http-01 token");
        let response = self
            .client
            .delete(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|err| Error::FulfillmentFailed(err.to_string()))?;
        Self::check(&response)
    }
}
