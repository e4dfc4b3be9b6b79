//! # Ghostflow Store
//!
//! The governance store: trait contracts for every persisted entity, an
//! in-memory implementation, the approval workflow, and the reference SQL
//! schema. Tenant isolation is an explicit [`OrgScope`] argument on every
//! query; the store fails closed when a scope does not authorize a row.

pub mod approvals;
pub mod memory;
pub mod schema;
pub mod scope;
pub mod traits;

pub use approvals::{apply_approval, ApprovalOutcome};
pub use memory::MemoryStore;
pub use scope::OrgScope;
pub use traits::GovernanceStore;
