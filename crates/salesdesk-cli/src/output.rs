//! Plain-text rendering of API results.
//!
//! Sale records are opaque JSON, so columns are read by path and anything
//! missing prints as "N/A".

use salesdesk_core::api::SaleDetail;
use salesdesk_core::auth::SessionData;
use salesdesk_core::models::{Customer, InventoryItem, Page, SalesQuery, User, Warehouse};
use serde_json::Value;

const MISSING: &str = "N/A";

/// Read a nested field as display text. Strings, numbers and booleans are
/// accepted; null and absent fields are `None`.
pub fn field(value: &Value, path: &[&str]) -> Option<String> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    match current {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn field_or_missing(value: &Value, path: &[&str]) -> String {
    field(value, path).unwrap_or_else(|| MISSING.to_string())
}

/// Format a decimal amount with two places. Amounts arrive as strings or
/// numbers; anything unparseable is shown as-is.
pub fn format_amount(raw: &str) -> String {
    match raw.trim().parse::<f64>() {
        Ok(amount) => format!("{:.2}", amount),
        Err(_) => raw.to_string(),
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a date string to a more readable format
pub fn format_date(date: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        dt.format("%b %d, %Y").to_string()
    } else if let Ok(d) = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        d.format("%b %d, %Y").to_string()
    } else {
        date.to_string()
    }
}

pub fn describe_user(user: &User) -> String {
    if user.role.is_empty() {
        user.full_name()
    } else {
        format!("{} ({})", user.full_name(), user.role)
    }
}

pub fn print_session(session: &SessionData) {
    println!("User:   {}", describe_user(&session.user));
    if !session.user.phone.is_empty() {
        println!("Phone:  {}", session.user.phone);
    }
    if !session.user.email.is_empty() {
        println!("Email:  {}", session.user.email);
    }
    println!(
        "Token:  refreshed {} min ago",
        session.token_age().num_minutes().max(0)
    );
    if let Some(ref error) = session.error {
        println!("Status: stale ({})", error);
    }
}

pub fn print_sales(page: &Page<Value>, query: &SalesQuery) {
    if page.results.is_empty() {
        println!("No sales found. Use `salesdesk sales create` to add one.");
        return;
    }

    println!(
        "{:<12} {:<24} {:<14} {:>12} {:<18} {:<8} {}",
        "Number", "Customer", "Date", "Total", "Warehouse", "Received", "UUID"
    );
    for sale in &page.results {
        let received = match sale.get("is_received").and_then(Value::as_bool) {
            Some(true) => "yes",
            Some(false) => "no",
            None => MISSING,
        };
        println!(
            "{:<12} {:<24} {:<14} {:>12} {:<18} {:<8} {}",
            truncate_string(&field_or_missing(sale, &["number"]), 12),
            truncate_string(&field_or_missing(sale, &["customer", "name"]), 24),
            field(sale, &["date"]).map(|d| format_date(&d)).unwrap_or_else(|| MISSING.to_string()),
            field(sale, &["total_price"]).map(|p| format_amount(&p)).unwrap_or_else(|| MISSING.to_string()),
            truncate_string(&field_or_missing(sale, &["warehouse", "name"]), 18),
            received,
            field_or_missing(sale, &["uuid"]),
        );
    }

    let pages = page.count.div_ceil(u64::from(query.page_size.max(1)));
    println!();
    print!("Page {} of {} ({} sales)", query.page, pages.max(1), page.count);
    if page.has_next() {
        print!(" - next: --page {}", query.page + 1);
    }
    println!();
}

pub fn print_sale_detail(detail: &SaleDetail) {
    let sale = &detail.sale;
    println!("Sale {}", field_or_missing(sale, &["number"]));
    println!("  Customer:  {}", field_or_missing(sale, &["customer", "name"]));
    println!("  Warehouse: {}", field_or_missing(sale, &["warehouse", "name"]));
    if let Some(date) = field(sale, &["date"]) {
        println!("  Date:      {}", format_date(&date));
    }
    println!(
        "  Discount:  {}",
        format_amount(&field(sale, &["discount_price"]).unwrap_or_else(|| "0".to_string()))
    );
    if let Some(total) = field(sale, &["total_price"]) {
        println!("  Total:     {}", format_amount(&total));
    }

    println!();
    if detail.lines.is_empty() {
        println!("No lines on this sale.");
        return;
    }
    println!("{} item(s)", detail.lines.len());
    println!("{:<28} {:>8} {:>12} {:>12}", "Product", "Qty", "Unit price", "Discount");
    for line in &detail.lines {
        println!(
            "{:<28} {:>8} {:>12} {:>12}",
            truncate_string(
                &field(line, &["product", "name"]).unwrap_or_else(|| "Unknown Product".to_string()),
                28
            ),
            field_or_missing(line, &["quantity"]),
            format_amount(&field(line, &["unit_price"]).unwrap_or_else(|| "0".to_string())),
            format_amount(&field(line, &["discount_price"]).unwrap_or_else(|| "0".to_string())),
        );
    }
}

pub fn print_customers(page: &Page<Customer>) {
    println!("{:<36} {:<28} {:>12}", "UUID", "Name", "Balance");
    for customer in &page.results {
        println!(
            "{:<36} {:<28} {:>12}",
            customer.uuid,
            truncate_string(&customer.name, 28),
            format_amount(&customer.balance)
        );
    }
}

pub fn print_warehouses(page: &Page<Warehouse>) {
    println!("{:<36} {:<24} {}", "UUID", "Name", "Location");
    for warehouse in &page.results {
        println!(
            "{:<36} {:<24} {}",
            warehouse.uuid,
            truncate_string(&warehouse.name, 24),
            warehouse.location
        );
    }
}

pub fn print_inventory(page: &Page<InventoryItem>) {
    if page.results.is_empty() {
        println!("Warehouse has no inventory.");
        return;
    }
    println!("{:<36} {:<28} {:>8} {:>10}", "Product UUID", "Name", "Stock", "Price");
    for item in &page.results {
        println!(
            "{:<36} {:<28} {:>8} {:>10}",
            item.product.uuid,
            truncate_string(&item.product.name, 28),
            item.product.stock_quantity,
            format_amount(&item.product.price)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_paths() {
        let sale = json!({"number": "S-1", "customer": {"name": "Acme"}, "total_price": 12.5, "warehouse": null, "note": ""});
        assert_eq!(field(&sale, &["customer", "name"]).as_deref(), Some("Acme"));
        assert_eq!(field(&sale, &["total_price"]).as_deref(), Some("12.5"));
        assert_eq!(field(&sale, &["warehouse", "name"]), None);
        assert_eq!(field(&sale, &["note"]), None);
        assert_eq!(field_or_missing(&sale, &["missing"]), "N/A");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount("12"), "12.00");
        assert_eq!(format_amount("-3.456"), "-3.46");
        assert_eq!(format_amount("n/a"), "n/a");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2026-10-19"), "Oct 19, 2026");
        assert_eq!(format_date("2026-10-19T08:30:00Z"), "Oct 19, 2026");
        assert_eq!(format_date("yesterday"), "yesterday");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
    }
}
