//! Ready-made [`ChallengeSolver`](crate::ChallengeSolver) implementations.
//!
//! These cover the common out-of-band mechanisms: a webroot directory on the
//! local filesystem, a WebDAV-capable remote webserver, and the PowerDNS
//! REST API. Anything else is a custom trait implementation away.

pub mod fs;
pub mod powerdns;
pub mod webdav;

pub use fs::FileSolver;
pub use powerdns::PowerDnsSolver;
pub use webdav::WebDavSolver;
