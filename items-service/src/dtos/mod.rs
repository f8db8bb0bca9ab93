pub mod items;

pub use items::{CreateItemRequest, CreateItemResponse, ItemResponse, ListItemsParams};
