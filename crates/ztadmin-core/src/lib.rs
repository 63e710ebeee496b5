// ztadmin-core: Network, member and dashboard logic on top of ztadmin-api.

pub mod aggregate;
pub mod backend;
pub mod error;
pub mod members;
pub mod mock;
pub mod names;
pub mod reconcile;

// ── Primary re-exports ──────────────────────────────────────────────
pub use aggregate::{
    DashboardStats, MemberView, NetworkDetail, NetworkSummary, dashboard_stats,
    detailed_networks, network_detail,
};
pub use backend::{Backend, BackendSelector};
pub use error::{CoreError, ErrorKind};
pub use members::{MemberEdit, add_member_ip, delete_member, remove_member_ip, rename_member};
pub use mock::MockController;
pub use names::MemberNames;
pub use reconcile::{
    MutationAction, canonical_target, easy_setup, reconcile_pools, reconcile_routes,
    update_ip_assignment_pools, update_routes,
};
