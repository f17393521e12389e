//! The replay-nonce pool.

use std::collections::HashSet;

use http::HeaderMap;

use crate::{b64u, Error};

/// An in-memory set of unused replay-nonces.
///
/// Every successful server response is scanned for a `Replay-Nonce` header
/// and its decoded value is added here; each signed request consumes one.
/// A nonce is single-use by definition, so the server handing out a value
/// already present in the pool is an error, as is a value that does not
/// decode as base64url.
#[derive(Debug, Default)]
pub(crate) struct NoncePool {
    nonces: HashSet<Vec<u8>>,
}

impl NoncePool {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.nonces.is_empty()
    }

    /// Decode and insert a `Replay-Nonce` header value.
    pub(crate) fn insert(&mut self, header_value: &str) -> Result<(), Error> {
        let nonce = b64u::decode(header_value).map_err(|_| Error::BadNonce)?;
        if !self.nonces.insert(nonce) {
            return Err(Error::DuplicateNonce);
        }
        Ok(())
    }

    /// Insert the `Replay-Nonce` from a response header map, if present.
    pub(crate) fn harvest(&mut self, headers: &HeaderMap) -> Result<(), Error> {
        match headers.get(crate::REPLAY_NONCE) {
            Some(value) => {
                let value = value.to_str().map_err(|_| Error::BadNonce)?;
                tracing::debug!(nonce = value, "harvested replay-nonce");
                self.insert(value)
            }
            None => Ok(()),
        }
    }

    /// Remove and return an arbitrary nonce.
    pub(crate) fn take(&mut self) -> Option<Vec<u8>> {
        let nonce = self.nonces.iter().next()?.clone();
        self.nonces.take(&nonce)
    }
}
