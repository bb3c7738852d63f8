//! Sales backend endpoints.
//!
//! Everything except login goes through `AuthenticatedClient::execute`, so an
//! expired token is refreshed transparently. Sale records are returned as raw
//! JSON.

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, info};

use super::{ApiError, ApiRequest, AuthenticatedClient, RequestError};
use crate::auth::SessionData;
use crate::models::{Customer, InventoryItem, Page, SalesQuery, Warehouse};

/// Sort order the inventory endpoint is asked for.
const INVENTORY_ORDERING: &str = "product__name";

/// Sale header and its lines, fetched together for the detail view.
#[derive(Debug, Clone)]
pub struct SaleDetail {
    pub sale: Value,
    pub lines: Vec<Value>,
}

impl AuthenticatedClient {
    /// Log in with phone and password and install the resulting session.
    pub async fn sign_in(&self, phone: &str, password: &str) -> Result<SessionData> {
        let response = self
            .transport()
            .login(phone, password)
            .await
            .context("Login failed")?;

        let (tokens, user) = response
            .into_parts()
            .ok_or_else(|| anyhow::anyhow!("Login response did not include both tokens"))?;

        let session = SessionData::new(tokens, user);
        self.store()
            .establish(session.clone())
            .await
            .context("Failed to save session")?;

        info!(user = %session.user.uuid, "Signed in");
        Ok(session)
    }

    /// Drop the session and route to login.
    pub async fn sign_out(&self) {
        self.store().invalidate("Signed out").await;
    }

    pub async fn list_sales(&self, query: &SalesQuery) -> Result<Page<Value>, RequestError> {
        let request = ApiRequest::get("/sales").query(query.to_query_pairs());
        let page: Page<Value> = self.execute(&request).await?.into_json()?;
        debug!(count = page.count, returned = page.results.len(), "Fetched sales");
        Ok(page)
    }

    pub async fn get_sale(&self, uuid: &str) -> Result<Value, RequestError> {
        let uuid = checked_id(uuid)?;
        let request = ApiRequest::get(format!("/sales/{}/", uuid));
        Ok(self.execute(&request).await?.body)
    }

    pub async fn get_sale_lines(&self, uuid: &str) -> Result<Vec<Value>, RequestError> {
        let uuid = checked_id(uuid)?;
        let request = ApiRequest::get(format!("/sales/{}/lines/", uuid));
        Ok(self.execute(&request).await?.into_json()?)
    }

    /// Fetch a sale and its lines concurrently.
    pub async fn get_sale_detail(&self, uuid: &str) -> Result<SaleDetail, RequestError> {
        let (sale, lines) =
            futures::future::try_join(self.get_sale(uuid), self.get_sale_lines(uuid)).await?;
        Ok(SaleDetail { sale, lines })
    }

    /// Post a sale payload exactly as given. The caller builds the whole
    /// body, including the client-generated `uuid`s.
    pub async fn create_sale(&self, sale: &Value) -> Result<Value, RequestError> {
        let request = ApiRequest::post("/sales/create/").json(sale)?;
        let created = self.execute(&request).await?.body;
        info!(
            lines = sale.get("lines").and_then(serde_json::Value::as_array).map_or(0, Vec::len),
            "Sale created"
        );
        Ok(created)
    }

    pub async fn delete_sale(&self, uuid: &str) -> Result<(), RequestError> {
        let uuid = checked_id(uuid)?;
        let request = ApiRequest::delete(format!("/sales/{}/delete/", uuid));
        self.execute(&request).await?;
        info!(sale = uuid, "Sale deleted");
        Ok(())
    }

    pub async fn list_customers(&self) -> Result<Page<Customer>, RequestError> {
        let request = ApiRequest::get("/customers/");
        Ok(self.execute(&request).await?.into_json()?)
    }

    pub async fn list_warehouses(&self) -> Result<Page<Warehouse>, RequestError> {
        let request = ApiRequest::get("/warehouses/");
        Ok(self.execute(&request).await?.into_json()?)
    }

    pub async fn warehouse_inventory(
        &self,
        warehouse_uuid: &str,
    ) -> Result<Page<InventoryItem>, RequestError> {
        let uuid = checked_id(warehouse_uuid)?;
        let request = ApiRequest::get(format!("/warehouses/{}/inventory", uuid))
            .query([("ordering", INVENTORY_ORDERING)]);
        Ok(self.execute(&request).await?.into_json()?)
    }
}

/// Identifiers are interpolated into URL paths, so they must be UUIDs.
fn checked_id(id: &str) -> Result<&str, ApiError> {
    let id = id.trim();
    if is_valid_uuid(id) {
        Ok(id)
    } else {
        Err(ApiError::InvalidId(id.to_string()))
    }
}

/// Validate that a string looks like a UUID:
/// xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx
fn is_valid_uuid(s: &str) -> bool {
    if s.len() != 36 {
        return false;
    }
    s.chars().enumerate().all(|(i, c)| {
        if i == 8 || i == 13 || i == 18 || i == 23 {
            c == '-'
        } else {
            c.is_ascii_hexdigit()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_uuid() {
        assert!(is_valid_uuid("0e65066c-ab20-4da0-b3bf-79dfd0668049"));
        assert!(is_valid_uuid("0E65066C-AB20-4DA0-B3BF-79DFD0668049"));

        assert!(!is_valid_uuid(""));
        assert!(!is_valid_uuid("../../admin"));
        assert!(!is_valid_uuid("0e65066cab204da0b3bf79dfd0668049"));
        assert!(!is_valid_uuid("0e65066c-ab20-4da0-b3bf-79dfd066804/"));
    }

    #[test]
    fn test_checked_id_trims() {
        assert_eq!(
            checked_id(" 0e65066c-ab20-4da0-b3bf-79dfd0668049\n").expect("valid"),
            "0e65066c-ab20-4da0-b3bf-79dfd0668049"
        );
        assert!(matches!(checked_id("1"), Err(ApiError::InvalidId(_))));
    }
}
