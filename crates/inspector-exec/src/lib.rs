//! inspector-exec: Remote execution abstraction
//!
//! Credential resolution plus the `Connector`/`RemoteSession` seam with an SSH
//! implementation and a local-shell implementation.

pub mod credentials;
pub mod error;
pub mod local;
pub mod result;
pub mod ssh;
pub mod traits;

pub use credentials::{AuthMethod, CredentialError, CredentialSources, Credentials};
pub use error::ExecError;
pub use local::LocalConnector;
pub use result::{CommandResult, ExitState, HostKeyPolicy, SshOptions};
pub use ssh::SshConnector;
pub use traits::{Connector, RemoteSession};
