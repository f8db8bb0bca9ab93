use crate::models::Item;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Raw `GET /items` query string. Everything stays a string so malformed
/// numbers reach [`crate::models::ListQuery`] instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct ListItemsParams {
    pub q: Option<String>,
    pub limit: Option<String>,
    pub page: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl ListItemsParams {
    /// Build from decoded query pairs. A repeated key keeps its first value
    /// and unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "q" => &mut params.q,
                "limit" => &mut params.limit,
                "page" => &mut params.page,
                "sort" => &mut params.sort,
                "order" => &mut params.order,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemRequest {
    #[validate(
        required(message = "name is required"),
        length(min = 1, message = "name must not be empty")
    )]
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateItemResponse {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemResponse {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        Self {
            id: item.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: item.name,
            created_at: item.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn repeated_keys_keep_the_first_value() {
        let params = ListItemsParams::from_pairs(pairs(&[
            ("limit", "1"),
            ("sort", "name"),
            ("limit", "2"),
            ("sort", "bogus"),
        ]));

        assert_eq!(params.limit.as_deref(), Some("1"));
        assert_eq!(params.sort.as_deref(), Some("name"));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let params = ListItemsParams::from_pairs(pairs(&[("colour", "red"), ("q", "wid")]));

        assert_eq!(params.q.as_deref(), Some("wid"));
        assert!(params.limit.is_none());
        assert!(params.page.is_none());
    }
}
