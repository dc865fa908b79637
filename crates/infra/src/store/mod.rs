//! Tenant-scoped transactional persistence for cash shifts and orders.
//!
//! All access goes through [`PosStore::begin`], which returns a transaction
//! bound to one tenant. Transactions of the same tenant are serialised; those
//! of different tenants run in parallel. A transaction dropped without
//! [`TenantTransaction::commit`] leaves no trace.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryPosStore;
pub use postgres::PostgresPosStore;
pub use r#trait::{OrderScope, PosStore, TenantTransaction};
