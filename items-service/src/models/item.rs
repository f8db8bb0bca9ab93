use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

/// Name of the collection holding [`Item`] documents.
pub const ITEMS_COLLECTION: &str = "items";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    /// Assigned by the store on insert.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// A not-yet-persisted item stamped with the current UTC time.
    ///
    /// The timestamp is taken at BSON (millisecond) precision so the value
    /// read back from the store equals the one written.
    pub fn new(name: String) -> Self {
        Self {
            id: None,
            name,
            created_at: BsonDateTime::now().to_chrono(),
        }
    }
}
