// ztadmin-api: Async Rust client for the ZeroTier network controller API

pub mod client;
pub mod error;
pub mod members;
pub mod models;
pub mod networks;
pub mod peers;
pub mod retry;
pub mod transport;

pub use client::{AUTH_HEADER, ControllerClient};
pub use error::Error;
pub use models::{
    ControllerStatus, Dns, IpAssignmentPool, Member, MemberRevisions, Network, Peer, PeerPath,
    Route, V4AssignMode,
};
pub use retry::RetryPolicy;
pub use transport::{TlsMode, TransportConfig};
