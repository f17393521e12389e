//! dns-01 fulfillment through the PowerDNS REST API.

use async_trait::async_trait;
use serde_json::json;

use crate::authorization::Challenge;
use crate::solver::ChallengeSolver;
use crate::Error;

/// Fulfills `dns-01` by replacing the `_acme-challenge.<domain>.` TXT rrset
/// through the PowerDNS API.
///
/// The record is left in place after validation; it is replaced on the next
/// run and harmless in between.
pub struct PowerDnsSolver {
    api_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl PowerDnsSolver {
    /// Create a solver for the PowerDNS instance at `api_url`, e.g.
    /// `http://ns1.example.com:8081`.
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let mut api_url = api_url.into();
        while api_url.ends_with('/') {
            api_url.pop();
        }
        Self {
            api_url,
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ChallengeSolver for PowerDnsSolver {
    async fn fulfill_dns_01(
        &self,
        domain: &str,
        _challenge: &Challenge,
        txt_value: &str,
    ) -> Result<bool, Error> {
        let endpoint = format!(
            "{}/api/v1/servers/localhost/zones/{}",
            self.api_url, domain
        );
        let update = json!({
            "rrsets": [{
                "name": format!("_acme-challenge.{}.", domain),
                "type": "TXT",
                "ttl": 1,
                "changetype": "REPLACE",
                "records": [{
                    "content": format!("\"{}\"", txt_value),
                    "disabled": false,
                }],
            }],
        });

        tracing::info!(%endpoint, "publishing dns-01 TXT record");
        let response = self
            .client
            .patch(&endpoint)
            .header("X-API-Key", &self.api_key)
            .json(&update)
            .send()
            .await
            .map_err(|err| Error::FulfillmentFailed(err.to_string()))?;

        if response.status().as_u16() != 204 {
            return Err(Error::FulfillmentFailed(format!(
                "PowerDNS API returned status {}",
                response.status()
            )));
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::authorization::ChallengeStatus;

    fn challenge() -> Challenge {
        Challenge {
            ty: crate::solver::DNS_01.to_string(),
            status: ChallengeStatus::Pending,
            url: "https://ca/chall/2".to_string(),
            token: "tok".to_string(),
        }
    }

    #[tokio::test]
    async fn patches_the_txt_rrset() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/api/v1/servers/localhost/zones/example.com"))
            .and(header("X-API-Key", "secret"))
            .and(body_string_contains("_acme-challenge.example.com."))
            .and(body_string_contains("\\\"digest-value\\\""))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        // trailing slashes in the configured URL are tolerated
        let solver = PowerDnsSolver::new(format!("{}/", server.uri()), "secret");
        assert!(solver
            .fulfill_dns_01("example.com", &challenge(), "digest-value")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn non_204_is_a_fulfillment_error() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(422))
            .mount(&server)
            .await;

        let solver = PowerDnsSolver::new(server.uri(), "secret");
        let err = solver
            .fulfill_dns_01("example.com", &challenge(), "digest-value")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FulfillmentFailed(_)));
    }
}
