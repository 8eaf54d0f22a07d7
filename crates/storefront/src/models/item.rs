//! Catalog items.

use serde::Serialize;

use shopfront_core::{ItemId, Price};

/// A catalog item (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    /// Item ID; also the stem of the image filename.
    pub id: ItemId,
    pub title: String,
    pub price: Price,
    pub description: String,
    /// Image file under the upload directory, e.g. `3.png`.
    pub filename: String,
}

/// Editable item fields, already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    pub title: String,
    pub price: Price,
    pub description: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_item_json_shape() {
        let item = Item {
            id: ItemId::new(3),
            title: "Mug".to_owned(),
            price: Price::parse("12.50").unwrap(),
            description: "Blue".to_owned(),
            filename: "3.png".to_owned(),
        };

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 3,
                "title": "Mug",
                "price": "12.50",
                "description": "Blue",
                "filename": "3.png",
            })
        );
    }
}
