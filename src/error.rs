//! The `Error` type and the ACME error-type URNs this client reacts to.

use std::fmt;

use openssl::error::ErrorStack as SslErrorStack;
use serde::Deserialize;

/// The ACME error string for a "bad nonce" error.
pub const BAD_NONCE: &str = "urn:ietf:params:acme:error:badNonce";

/// The ACME error string for a "rate limited" error.
pub const RATE_LIMITED: &str = "urn:ietf:params:acme:error:rateLimited";

/// The ACME error string for an "unauthorized" error.
pub const UNAUTHORIZED: &str = "urn:ietf:params:acme:error:unauthorized";

/// The ACME error string for an "external account required" error.
pub const EXTERNAL_ACCOUNT_REQUIRED: &str = "urn:ietf:params:acme:error:externalAccountRequired";

/// An ACME error response contains a specially formatted type string, and can
/// optionally contain textual details and a set of sub problems.
#[derive(Clone, Debug, Deserialize)]
pub struct ErrorResponse {
    /// The ACME error type string.
    ///
    /// Well-known values (bad nonce, rate limited, unauthorized, external
    /// account required) map to dedicated [`Error`] variants when a response
    /// is classified; everything else surfaces as [`Error::Api`].
    #[serde(rename = "type")]
    pub ty: String,

    /// A textual detail string optionally provided by the ACME provider to
    /// inform the user more verbosely about why the error occurred.
    pub detail: Option<String>,

    /// Additional json data containing information as to why the error
    /// occurred.
    pub subproblems: Option<serde_json::Value>,
}

/// Error types returned by this crate.
#[derive(Debug)]
#[must_use = "unused errors have no effect"]
pub enum Error {
    /// A transport level failure reaching the server.
    Connect(String),

    /// A network request or a protocol phase exceeded its deadline.
    Timeout,

    /// A `badNonce` API response, or a malformed `Replay-Nonce` header. The
    /// request engine retries exactly once with a fresh nonce before letting
    /// this propagate.
    BadNonce,

    /// The server handed out a `Replay-Nonce` it had already issued. Nonces
    /// are single-use, so this indicates server misbehavior.
    DuplicateNonce,

    /// An error response which could not be parsed as an RFC 7807 problem
    /// document.
    Undecodable(String),

    /// A `rateLimited` API response. Fatal to the current operation.
    RateLimited,

    /// An `unauthorized` API response.
    Unauthorized,

    /// The directory requires an external account binding but none was
    /// supplied, or the server demanded one.
    ExternalAccountRequired,

    /// An operation requiring a bound account was called on a client which
    /// has no account URL yet.
    NotRegistered,

    /// Tried to register an account on a client which is already bound to
    /// one.
    AlreadyRegistered,

    /// An authorization reached a terminal state other than `valid`.
    Authorization(String),

    /// No challenge of an authorization could be fulfilled, or a solver's
    /// external call failed.
    FulfillmentFailed(String),

    /// The server refused to finalize the order or declared it invalid while
    /// waiting for the certificate.
    Certificate(String),

    /// Other error responses from the Acme API not handled specially.
    Api {
        /// The HTTP status code the error arrived with.
        status: u16,
        /// The parsed problem document.
        problem: ErrorResponse,
    },

    /// The Acme API behaved unexpectedly.
    InvalidApi(String),

    /// Tried to use an empty identifier list for an order.
    EmptyOrder,

    /// A key of an unsupported type was passed.
    UnsupportedKeyType,

    /// An EC key with an unsupported curve was passed.
    UnsupportedGroup,

    /// An openssl error occurred during a crypto operation.
    RawSsl(SslErrorStack),

    /// An openssl error occurred during a crypto operation.
    /// With some textual context.
    Ssl(&'static str, SslErrorStack),

    /// An otherwise uncaught serde error happened.
    Json(serde_json::Error),

    /// Failed to decode base64 data.
    BadBase64(base64::DecodeError),

    /// A non-openssl error occurred while building data for the CSR.
    Csr(String),

    /// Can be used by the user for textual error messages without having to
    /// downcast to regular acme errors.
    Custom(String),
}

impl Error {
    /// Create an `Error` from a custom text.
    pub fn custom<T: fmt::Display>(s: T) -> Self {
        Error::Custom(s.to_string())
    }

    /// Convenience method to check if this error represents a bad nonce error
    /// in which case the request needs to be re-created using a new nonce.
    pub fn is_bad_nonce(&self) -> bool {
        matches!(self, Error::BadNonce)
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Connect(err) => write!(f, "failed to reach the ACME server: {}", err),
            Error::Timeout => f.write_str("request or protocol phase timed out"),
            Error::BadNonce => f.write_str("bad nonce, please retry with a new nonce"),
            Error::DuplicateNonce => f.write_str("server reissued an already seen nonce"),
            Error::Undecodable(err) => {
                write!(f, "undecodable error response from ACME server: {}", err)
            }
            Error::RateLimited => f.write_str("rate limited by the ACME server"),
            Error::Unauthorized => f.write_str("unauthorized"),
            Error::ExternalAccountRequired => {
                f.write_str("the ACME provider requires an external account binding")
            }
            Error::NotRegistered => f.write_str("client is not bound to an account"),
            Error::AlreadyRegistered => f.write_str("client is already bound to an account"),
            Error::Authorization(status) => {
                write!(f, "authorization failed with status '{}'", status)
            }
            Error::FulfillmentFailed(err) => write!(f, "challenge fulfillment failed: {}", err),
            Error::Certificate(err) => write!(f, "certificate issuance failed: {}", err),
            Error::Api { status, problem } => match problem.detail.as_deref() {
                Some(detail) => write!(f, "[{}] {} {}", status, problem.ty, detail),
                None => write!(f, "[{}] {}", status, problem.ty),
            },
            Error::InvalidApi(err) => write!(f, "Acme Server API misbehaved: {}", err),
            Error::EmptyOrder => f.write_str("cannot make an empty order"),
            Error::UnsupportedKeyType => f.write_str("unsupported key type"),
            Error::UnsupportedGroup => f.write_str("unsupported EC group"),
            Error::RawSsl(err) => fmt::Display::fmt(err, f),
            Error::Ssl(context, err) => write!(f, "{}: {}", context, err),
            Error::Json(err) => fmt::Display::fmt(err, f),
            Error::BadBase64(err) => fmt::Display::fmt(err, f),
            Error::Csr(err) => fmt::Display::fmt(err, f),
            Error::Custom(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl From<SslErrorStack> for Error {
    fn from(e: SslErrorStack) -> Self {
        Error::RawSsl(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::BadBase64(e)
    }
}
