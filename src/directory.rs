//! ACME Directory information.

use serde::{Deserialize, Serialize};

/// The ACME directory object as received via a `GET` request to the
/// directory URL. It is fetched lazily, cached for the lifetime of the
/// client and never re-fetched.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Directory {
    /// The entry point to create a new account.
    pub new_account: String,

    /// URL to post new orders to.
    pub new_order: String,

    /// The entry point to retrieve a new nonce, should be used with a `HEAD`
    /// request. Optional; without it nonces are requested from the target URL
    /// of the request that needs one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_nonce: Option<String>,

    /// Metadata object, for additional information which aren't directly
    /// part of the API itself, such as the terms of service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

/// The directory's "meta" object.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    /// The terms of service. This is typically in the form of an URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,

    /// Flag indicating if EAB is required, None is equivalent to false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_account_required: Option<bool>,

    /// Website with information about the ACME Server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// List of hostnames used by the CA, intended for the use with caa dns
    /// records.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub caa_identities: Vec<String>,
}

impl Directory {
    /// Get the ToS URL.
    pub fn terms_of_service_url(&self) -> Option<&str> {
        match &self.meta {
            Some(meta) => meta.terms_of_service.as_deref(),
            None => None,
        }
    }

    /// Get if external account binding is required.
    pub fn external_account_required(&self) -> bool {
        matches!(
            &self.meta,
            Some(Meta {
                external_account_required: Some(true),
                ..
            })
        )
    }
}
