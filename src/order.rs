//! Order data: the wire representation and the client-side view used to
//! drive the authorization machine.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status of an order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Authorizations still need to be completed.
    Pending,

    /// All authorizations are valid, the order awaits finalization.
    Ready,

    /// The CA is processing the finalized order.
    Processing,

    /// The certificate has been issued.
    Valid,

    /// The order failed.
    Invalid,
}

impl Status {
    /// Convenience method to check if the status is 'valid'.
    #[inline]
    pub fn is_valid(self) -> bool {
        self == Status::Valid
    }

    /// Convenience method to check if the status is 'invalid'.
    #[inline]
    pub fn is_invalid(self) -> bool {
        self == Status::Invalid
    }
}

/// An identifier to order a certificate for.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Identifier {
    /// A DNS name.
    Dns(String),
}

impl Identifier {
    /// The identifier value.
    pub fn value(&self) -> &str {
        match self {
            Identifier::Dns(domain) => domain,
        }
    }
}

/// The order object as returned by the server on creation and when polling
/// the order URL.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderData {
    /// The order status.
    pub status: Status,

    /// This order's expiration date as RFC3339 formatted time string.
    #[serde(default)]
    pub expires: Option<String>,

    /// List of identifiers the order is for.
    #[serde(default)]
    pub identifiers: Vec<Identifier>,

    /// List of URLs to authorizations the client needs to complete.
    #[serde(default)]
    pub authorizations: Vec<String>,

    /// URL the final CSR needs to be POSTed to in order to complete the
    /// order, once all authorizations have been performed.
    #[serde(default)]
    pub finalize: Option<String>,

    /// URL at which the issued certificate can be fetched once it is
    /// available.
    #[serde(default)]
    pub certificate: Option<String>,

    /// Possible errors in this order.
    #[serde(default)]
    pub error: Option<Value>,
}

/// A domain paired with the URL of its authorization, in the order the
/// server returned them.
#[derive(Clone, Debug)]
pub struct OrderAuthorization {
    /// The domain the authorization is for.
    pub domain: String,

    /// The authorization URL, polled via POST-as-GET.
    pub url: String,
}

/// A created order, as handed to the caller by
/// [`AcmeClient::new_order`](crate::AcmeClient::new_order).
#[derive(Clone, Debug)]
pub struct Order {
    /// Order location URL, used to poll the order after finalization.
    pub location: String,

    /// The pending authorizations, one per requested identifier.
    pub authorizations: Vec<OrderAuthorization>,

    /// URL to POST the CSR to.
    pub finalize: String,
}
