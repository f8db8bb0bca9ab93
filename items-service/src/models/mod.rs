pub mod item;
pub mod query;

pub use item::Item;
pub use query::{ListQuery, SortField, SortOrder};
