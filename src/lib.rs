//! ACME protocol client.
//!
//! This implements the client side of RFC 8555: it registers accounts
//! (optionally with an RFC 8555 §7.3.4 external account binding), proves
//! control of DNS identifiers by fulfilling challenges through a pluggable
//! [`ChallengeSolver`], finalizes orders with a CSR and downloads the issued
//! certificate chain.
//!
//! The interesting part is the protocol engine in [`AcmeClient`]: every
//! request is signed into a flattened JWS, replay-nonces are pooled and
//! consumed one per request, a `badNonce` rejection is retried exactly once,
//! and the order/authorization state machine is polled with jittered delays
//! under wall-clock deadlines. The HTTP layer is the small [`HttpTransport`]
//! trait with a reqwest-backed default, so the whole engine can be driven
//! against a scripted stub in tests.
//!
//! Ready-made solvers for a webroot directory, WebDAV uploads and the
//! PowerDNS API live in [`solvers`]; anything else is one trait
//! implementation away.

#![deny(missing_docs)]
#![deny(unsafe_code)]

mod b64u;
mod jws;
mod nonce;

pub mod authorization;
pub mod directory;
pub mod eab;
pub mod error;
pub mod order;
pub mod solver;
pub mod solvers;
pub mod transport;
pub mod util;

pub mod client;

mod key;

#[doc(inline)]
pub use client::{AcmeClient, AcmeClientBuilder};

#[doc(inline)]
pub use authorization::{Authorization, Challenge};

#[doc(inline)]
pub use directory::Directory;

#[doc(inline)]
pub use eab::ExternalAccountKey;

#[doc(inline)]
pub use error::Error;

#[doc(inline)]
pub use key::AccountKey;

#[doc(inline)]
pub use order::{Order, OrderAuthorization};

#[doc(inline)]
pub use solver::{ChallengeSolver, NullSolver};

#[doc(inline)]
pub use transport::{HttpRequest, HttpResponse, HttpTransport};

// we don't inline these:
pub use error::ErrorResponse;
pub use key::{Jwk, PublicKey};

/// Header name for nonces.
pub const REPLAY_NONCE: &str = "replay-nonce";

/// Header name for locations.
pub const LOCATION: &str = "location";

/// Content type of JWS-signed request bodies.
pub const JOSE_CONTENT_TYPE: &str = "application/jose+json";
