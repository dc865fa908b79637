//! Catalog items as seen by the order core: products and combos with their
//! current price.
//!
//! Catalog maintenance (create/edit/search) lives outside this workspace; the
//! core only reads through [`CatalogLookup`].

pub mod combo;
pub mod in_memory;
pub mod lookup;
pub mod product;

pub use combo::{Combo, ComboComponent, ComboId};
pub use in_memory::InMemoryCatalog;
pub use lookup::CatalogLookup;
pub use product::{Product, ProductId};
