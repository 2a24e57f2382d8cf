use clap::Args;
use jiff::{Zoned, civil::Date};
use till::{
    orders::{Order, OrderId},
    receipt::Receipt,
};
use till_app::api::{OrderRange, cancellable};

use super::{Runtime, render};

#[derive(Debug, Args)]
pub(crate) struct OrdersArgs {
    /// Show a single order as a receipt
    #[arg(long, conflicts_with_all = ["from", "to"])]
    order: Option<OrderId>,

    /// First day to include (YYYY-MM-DD)
    #[arg(long)]
    from: Option<Date>,

    /// Last day to include (YYYY-MM-DD); defaults to today when `--from` is given
    #[arg(long)]
    to: Option<Date>,
}

pub(crate) async fn run(args: OrdersArgs, runtime: &Runtime) -> Result<(), String> {
    if let Some(order_id) = args.order {
        return show(order_id, runtime).await;
    }

    let cashier_id = runtime
        .config()
        .cashier_id()
        .map_err(|error| error.to_string())?;

    let mut desk = runtime.refund_desk();

    let orders = match range(args.from, args.to) {
        Some(range) => {
            desk.load_orders_in_range(cashier_id, range, runtime.cancel())
                .await
        }
        None => desk.load_orders(cashier_id, runtime.cancel()).await,
    }
    .map_err(|error| format!("failed to load orders: {error}"))?;

    if orders.is_empty() {
        println!("no orders found");
        return Ok(());
    }

    let currency = runtime.currency();

    println!(
        "{}",
        render::table(
            ["Order", "Placed", "Customer", "Payment", "Status", "Items", "Total"],
            orders.iter().map(|order| {
                [
                    order.label(),
                    order
                        .created_at
                        .map(|placed| placed.strftime("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default(),
                    customer_name(order).to_string(),
                    order
                        .payment_type
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_default(),
                    format!("{:?}", order.status),
                    order
                        .items
                        .iter()
                        .map(|line| u64::from(line.quantity))
                        .sum::<u64>()
                        .to_string(),
                    render::amount(order.total_amount, currency),
                ]
            }),
            5,
        )
    );

    Ok(())
}

async fn show(order_id: OrderId, runtime: &Runtime) -> Result<(), String> {
    let order = cancellable(runtime.cancel(), runtime.services().orders.get_order(order_id))
        .await
        .map_err(|error| format!("failed to load order: {error}"))?;

    super::sell::print_receipt(&Receipt::for_order(&order), runtime)
}

/// Whole-day window for the flags given, if any.
fn range(from: Option<Date>, to: Option<Date>) -> Option<OrderRange> {
    match (from, to) {
        (None, None) => None,
        (Some(from), Some(to)) => Some(OrderRange::days(from, to)),
        (Some(from), None) => Some(OrderRange::days(from, Zoned::now().date())),
        (None, Some(to)) => Some(OrderRange::days(to, to)),
    }
}

fn customer_name(order: &Order) -> &str {
    order
        .customer
        .as_ref()
        .and_then(|customer| customer.full_name.as_deref())
        .unwrap_or("Walk-in")
}
