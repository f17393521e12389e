//! http-01 fulfillment through a local webroot directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::authorization::Challenge;
use crate::solver::ChallengeSolver;
use crate::Error;

/// Fulfills `http-01` by writing the key authorization to
/// `<root>/<token>`, where `root` is a directory the local webserver maps to
/// `/.well-known/acme-challenge/`.
pub struct FileSolver {
    root: PathBuf,
}

impl FileSolver {
    /// Create a solver writing tokens below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn token_path(&self, challenge: &Challenge) -> PathBuf {
        // the token is server-controlled, never let it escape the webroot
        self.root.join(Path::new(&challenge.token).file_name().unwrap_or_default())
    }
}

#[async_trait]
impl ChallengeSolver for FileSolver {
    async fn fulfill_http_01(
        &self,
        _domain: &str,
        challenge: &Challenge,
        key_authorization: &str,
    ) -> Result<bool, Error> {
        let path = self.token_path(challenge);
        tracing::info!(path = %path.display(), "writing http-01 token");
        tokio::fs::write(&path, key_authorization)
            .await
            .map_err(|err| {
                Error::FulfillmentFailed(format!(
                    "failed to write token to {}: {}",
                    path.display(),
                    err
                ))
            })?;
        Ok(true)
    }

    async fn clear_http_01(&self, _domain: &str, challenge: &Challenge) -> Result<(), Error> {
        let path = self.token_path(challenge);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::FulfillmentFailed(format!(
                "failed to remove token {}: {}",
                path.display(),
                err
            ))),
        }
    }
}
