//! Test Helpers

use till::{
    customers::{Customer, CustomerId},
    orders::{CashierId, Order, OrderId, OrderLine, OrderLineId, OrderStatus, PaymentMethod, StoreId},
    products::{Product, ProductId},
    refunds::{Refund, RefundId, RefundRequest},
};

use crate::terminal::TerminalContext;

pub(crate) fn terminal_context() -> TerminalContext {
    TerminalContext {
        store_id: StoreId::new("5"),
        branch_id: None,
        cashier_id: Some(CashierId::new("3")),
    }
}

pub(crate) fn products() -> Vec<Product> {
    vec![
        Product::new("1", "Linen Shirt", 59_900)
            .with_sku("SH-001")
            .with_brand("Loom"),
        Product::new("2", "Denim Jeans", 39_900)
            .with_sku("JN-002")
            .with_brand("Indigo Co"),
        Product::new("3", "Canvas Tote", 24_900).with_sku("TT-003"),
    ]
}

fn customer(id: &str, name: &str, phone: &str) -> Customer {
    Customer {
        id: CustomerId::new(id),
        full_name: name.to_string(),
        email: format!("{}@example.com", id.replace('-', "")),
        phone: phone.to_string(),
        address: None,
    }
}

pub(crate) fn customers() -> Vec<Customer> {
    vec![
        customer("c-1", "Asha Rao", "555-0100"),
        customer("c-2", "Rahul Menon", "555-0101"),
    ]
}

fn order(id: &str, items: Vec<OrderLine>, total: i64) -> Order {
    Order {
        id: OrderId::new(id),
        order_number: Some(format!("ORD-{id}")),
        customer: None,
        items,
        subtotal: total,
        tax: None,
        discount: None,
        total_amount: total,
        payment_type: Some(PaymentMethod::Cash),
        status: OrderStatus::Completed,
        created_at: None,
    }
}

/// An order as returned by order creation, which omits the lines. `total` is in major units.
pub(crate) fn placed_order(id: &str, total: i64) -> Order {
    order(id, Vec::new(), total * 100)
}

fn line(id: &str, product: &str, name: &str, quantity: u32, price: i64) -> OrderLine {
    OrderLine {
        id: Some(OrderLineId::new(id)),
        product_id: ProductId::new(product),
        product_name: Some(name.to_string()),
        product: None,
        quantity,
        price,
        subtotal: None,
    }
}

/// Order 1042: one shirt at 599 and three pairs of socks at 99, 896 in all.
pub(crate) fn sold_order() -> Order {
    order(
        "1042",
        vec![
            line("a", "7", "Linen Shirt", 1, 59_900),
            line("b", "8", "Socks", 3, 9_900),
        ],
        89_600,
    )
}

pub(crate) fn make_refund(id: &str, request: &RefundRequest) -> Refund {
    Refund {
        id: RefundId::new(id),
        order_id: Some(request.order_id.clone()),
        order: None,
        reason: request.reason.to_string(),
        amount: request.amount,
        cashier: None,
        payment_type: request.payment_type,
        created_at: None,
    }
}
