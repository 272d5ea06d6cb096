use std::fmt::Write;

use super::entity::Order;

/// Archive key for an order's receipt
pub fn receipt_key(order_id: &str) -> String {
    format!("{}.txt", order_id)
}

/// Render the flat text receipt for a completed order
pub fn render_receipt(order: &Order) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "Order Receipt:");
    let _ = writeln!(out, "==============");
    let _ = writeln!(out, "ID: {}", order.id);
    let _ = writeln!(out, "Title: {}", order.title.as_deref().unwrap_or_default());
    let _ = writeln!(out, "Description: {}", order.description.as_deref().unwrap_or_default());
    let _ = writeln!(out, "Quantity: {}", order.quantity);
    let _ = writeln!(out, "Status: {}", order.status);
    out
}
