//! Infrastructure layer: tenant-scoped persistence, catalog/customer adapters
//! and the two managers that drive the order core.

pub mod error;
pub mod lookups;
pub mod orders;
pub mod shifts;
pub mod store;


pub use error::PosError;
pub use lookups::{PostgresCatalog, PostgresCustomers};
pub use orders::{
    DetailsPatch, NewOrder, OrderLifecycleManager, OrderLineView, OrderView, UNKNOWN_ITEM,
};
pub use shifts::{CashShiftManager, ClosedShift};
pub use store::{InMemoryPosStore, OrderScope, PosStore, PostgresPosStore, TenantTransaction};
