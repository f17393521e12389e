//! Authorization and Challenge data.

use serde::{Deserialize, Serialize};

use crate::order::Identifier;

/// Status of an [`Authorization`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The authorization was deactivated by the client.
    Deactivated,

    /// The authorization expired.
    Expired,

    /// The authorization failed and is now invalid.
    Invalid,

    /// Validation is pending.
    Pending,

    /// The authorization was revoked by the server.
    Revoked,

    /// The identifier is authorized.
    Valid,
}

impl Status {
    /// Convenience method to check if the status is 'pending'.
    #[inline]
    pub fn is_pending(self) -> bool {
        self == Status::Pending
    }

    /// Convenience method to check if the status is 'valid'.
    #[inline]
    pub fn is_valid(self) -> bool {
        self == Status::Valid
    }

    /// The RFC 8555 status string.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Deactivated => "deactivated",
            Status::Expired => "expired",
            Status::Invalid => "invalid",
            Status::Pending => "pending",
            Status::Revoked => "revoked",
            Status::Valid => "valid",
        }
    }
}

/// Represents an authorization state for an order. The client picks one of
/// its challenges, fulfills it via a solver, and then requests validation.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
    /// The identifier (usually domain name) this authorization is for.
    pub identifier: Identifier,

    /// The current status of this authorization entry.
    pub status: Status,

    /// Expiration date for the authorization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,

    /// List of challenges which can be used to complete this authorization.
    pub challenges: Vec<Challenge>,

    /// The authorization is for a wildcard domain.
    #[serde(default, skip_serializing_if = "is_false")]
    pub wildcard: bool,
}

/// The state of a challenge.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    /// The challenge is pending and has not been validated yet.
    Pending,

    /// The validation is in progress.
    Processing,

    /// The challenge was successfully validated.
    Valid,

    /// Validation of this challenge failed.
    Invalid,
}

/// A challenge object contains information on how to complete an
/// authorization for an order.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    /// The challenge type (such as `"dns-01"`).
    #[serde(rename = "type")]
    pub ty: String,

    /// The current challenge status.
    #[serde(default = "pending")]
    pub status: ChallengeStatus,

    /// The URL used to post to in order to begin the validation for this
    /// challenge.
    pub url: String,

    /// The token used to compute the key authorization. Not all challenge
    /// types carry one.
    #[serde(default)]
    pub token: String,
}

/// Serde helper
#[inline]
fn is_false(b: &bool) -> bool {
    !*b
}

/// Serde helper
#[inline]
fn pending() -> ChallengeStatus {
    ChallengeStatus::Pending
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_a_pending_authorization() {
        let auth: Authorization = serde_json::from_str(
            r#"{
                "identifier": {"type": "dns", "value": "example.com"},
                "status": "pending",
                "expires": "2026-09-01T14:09:07.99Z",
                "challenges": [
                    {"type": "http-01", "status": "pending", "url": "https://ca/chall/1", "token": "tok1"},
                    {"type": "dns-01", "status": "pending", "url": "https://ca/chall/2", "token": "tok2"},
                    {"type": "tls-alpn-01", "status": "pending", "url": "https://ca/chall/3", "token": "tok3"}
                ]
            }"#,
        )
        .unwrap();
        assert!(auth.status.is_pending());
        assert!(!auth.wildcard);
        assert_eq!(auth.challenges.len(), 3);
        assert_eq!(auth.challenges[1].ty, "dns-01");
        assert_eq!(auth.challenges[1].token, "tok2");
    }

    #[test]
    fn terminal_statuses_round_trip_their_names() {
        for (status, name) in [
            (Status::Invalid, "invalid"),
            (Status::Deactivated, "deactivated"),
            (Status::Expired, "expired"),
            (Status::Revoked, "revoked"),
        ] {
            assert_eq!(status.as_str(), name);
            let parsed: Status = serde_json::from_str(&format!("\"{}\"", name)).unwrap();
            assert_eq!(parsed, status);
        }
    }
}
