//! Till prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{
        Adjustments, Cart, CartError, CartLine, CartProduct, Discount, HeldOrder, HeldOrders,
        InvalidDiscount, TaxRate, Totals, compute_totals,
    },
    customers::{Customer, CustomerId, CustomerSelection, NewCustomer, WALK_IN},
    ids::TypedId,
    money::{AmountError, DEFAULT_CURRENCY},
    orders::{
        BranchId, CashierId, CustomerSummary, Order, OrderContext, OrderId, OrderItemRequest,
        OrderLine, OrderLineId, OrderRequest, OrderStatus, PaymentMethod, StoreId,
        UnknownPaymentMethod,
    },
    products::{Catalog, Product, ProductId, search},
    receipt::{Receipt, ReceiptError, ReceiptLine},
    refunds::{BlankReason, Refund, RefundId, RefundRequest, ReturnReason},
    resource::Resource,
    returns::{RefundPolicy, ReturnError, ReturnItem, ReturnSheet},
};
