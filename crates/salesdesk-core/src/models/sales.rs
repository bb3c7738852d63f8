use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub uuid: String,
    pub name: String,
    /// Decimal string as sent by the server.
    #[serde(default)]
    pub balance: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default)]
    pub price: String,
}

/// A warehouse inventory row. Only the product is interpreted; the rest of
/// the row is kept as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub product: Product,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Paginated list envelope used by the list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

/// Filters for the sales list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesQuery {
    pub page: u32,
    pub page_size: u32,
    pub is_received: Option<bool>,
}

impl Default for SalesQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
            is_received: Some(true),
        }
    }
}

impl SalesQuery {
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("page_size".to_string(), self.page_size.to_string()),
        ];
        if let Some(received) = self.is_received {
            pairs.push(("is_received".to_string(), received.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sales_query_pairs() {
        let pairs = SalesQuery::default().to_query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("page".to_string(), "1".to_string()),
                ("page_size".to_string(), "10".to_string()),
                ("is_received".to_string(), "true".to_string()),
            ]
        );

        let query = SalesQuery {
            page: 3,
            page_size: 25,
            is_received: None,
        };
        assert_eq!(query.to_query_pairs().len(), 2);
    }

    #[test]
    fn test_parse_inventory_keeps_extra_fields() {
        let json = r#"{"count": 1, "results": [{"product": {"uuid": "p-1", "name": "Cola", "stock_quantity": 40, "price": "1.50"}, "quantity": 12}]}"#;
        let page: Page<InventoryItem> = serde_json::from_str(json).expect("valid inventory json");
        assert_eq!(page.results[0].product.name, "Cola");
        assert_eq!(page.results[0].extra["quantity"], 12);
    }

    #[test]
    fn test_parse_page_of_opaque_sales() {
        let json = r#"{"count": 1, "next": null, "previous": null, "results": [{"uuid": "s-1", "number": "S-0001", "total_price": "12.00", "customer": {"name": "Acme"}}]}"#;
        let page: Page<serde_json::Value> = serde_json::from_str(json).expect("valid page json");
        assert_eq!(page.count, 1);
        assert!(!page.has_next());
        assert_eq!(page.results[0]["number"], "S-0001");
    }
}
