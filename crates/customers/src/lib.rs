//! Customers and their delivery addresses, read by the order core through
//! [`CustomerLookup`].

pub mod customer;
pub mod in_memory;
pub mod lookup;

pub use customer::{Address, AddressId, Customer, CustomerId};
pub use in_memory::InMemoryCustomers;
pub use lookup::CustomerLookup;
