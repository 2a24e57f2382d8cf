use std::str::FromStr;

use clap::Args;
use rust_decimal::Decimal;
use till::{
    money,
    orders::{OrderId, OrderLineId},
    refunds::ReturnReason,
    returns::{ReturnItem, ReturnSheet},
};
use till_app::refund_desk::RefundDesk;

use super::{Runtime, render};

/// An order line with an optional quantity, written `LINE` or `LINE:QTY`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LineSpec {
    line: OrderLineId,
    quantity: Option<i64>,
}

impl FromStr for LineSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (line, quantity) = match s.rsplit_once(':') {
            Some((line, quantity)) => (
                line,
                Some(
                    quantity
                        .trim()
                        .parse()
                        .map_err(|_err| format!("invalid quantity in `{s}`"))?,
                ),
            ),
            None => (s, None),
        };

        let line = line.trim();

        if line.is_empty() {
            return Err(format!("missing line id in `{s}`"));
        }

        Ok(Self {
            line: OrderLineId::new(line),
            quantity,
        })
    }
}

#[derive(Debug, Args)]
pub(crate) struct RefundArgs {
    /// Order to refund against
    #[arg(short, long)]
    order: OrderId,

    /// Line to return as LINE (all units) or LINE:QTY; omit to list the order's lines
    #[arg(short, long = "item")]
    items: Vec<LineSpec>,

    /// Return reason: damaged, defective, wrong-size, wrong-item, color-mismatch, quality,
    /// changed-mind, or free text
    #[arg(short, long)]
    reason: Option<ReturnReason>,

    /// Amount to refund, when operator-entered amounts are enabled
    #[arg(short, long)]
    amount: Option<Decimal>,
}

pub(crate) async fn run(args: RefundArgs, runtime: &Runtime) -> Result<(), String> {
    let mut desk = runtime.refund_desk();

    let sheet = desk
        .open_order(args.order, runtime.cancel())
        .await
        .map_err(|error| format!("failed to load order: {error}"))?;

    if args.items.is_empty() {
        print_sheet(sheet, runtime);
        return Ok(());
    }

    select(&mut desk, &args.items)?;

    desk.set_reason(args.reason);
    desk.set_manual_amount(
        args.amount
            .map(money::minor_from_decimal)
            .transpose()
            .map_err(|error| format!("invalid amount: {error}"))?,
    );

    if let Some(sheet) = desk.sheet() {
        print_sheet(sheet, runtime);
    }

    let refund = desk
        .submit(runtime.cancel())
        .await
        .map_err(|error| format!("refund failed: {error}"))?;

    println!("refund_id: {}", refund.id);
    println!(
        "refund_amount: {}",
        render::amount(refund.amount, runtime.currency())
    );

    Ok(())
}

fn select(desk: &mut RefundDesk, items: &[LineSpec]) -> Result<(), String> {
    for item in items {
        let ordered = desk
            .sheet()
            .and_then(|sheet| sheet.item(&item.line))
            .map(ReturnItem::ordered)
            .ok_or_else(|| format!("order has no line {}", item.line))?;

        let quantity = item.quantity.unwrap_or_else(|| i64::from(ordered));

        desk.set_return_qty(&item.line, quantity)
            .map_err(|error| error.to_string())?;
    }

    Ok(())
}

fn print_sheet(sheet: &ReturnSheet, runtime: &Runtime) {
    let currency = runtime.currency();

    println!("Order {}", sheet.order().label());
    println!(
        "{}",
        render::table(
            ["Line", "Item", "Sold", "Returning", "Price", "Refund"],
            sheet.items().iter().map(|item| {
                [
                    item.id().to_string(),
                    item.line().display_name().to_string(),
                    item.ordered().to_string(),
                    item.return_qty().to_string(),
                    render::amount(item.line().price, currency),
                    render::amount(item.refund_amount(), currency),
                ]
            }),
            2,
        )
    );
    println!(
        " Refund total  {}",
        render::amount(sheet.refund_total(), currency)
    );
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;
    use till::{orders::Order, returns::RefundPolicy};
    use till_app::{
        api::{MockCatalogService, MockOrdersService, MockRefundsService},
        context::AppContext,
    };
    use tokio_util::sync::CancellationToken;

    use super::*;

    async fn desk_for_order(order: Order) -> TestResult<RefundDesk> {
        let mut orders = MockOrdersService::new();

        orders
            .expect_get_order()
            .once()
            .return_once(move |_| Ok(order));

        let mut desk = RefundDesk::new(
            AppContext::new(MockCatalogService::new(), orders, MockRefundsService::new()),
            RefundPolicy::default(),
        );

        desk.open_order(OrderId::new("1042"), &CancellationToken::new())
            .await?;

        Ok(desk)
    }

    fn returning(desk: &RefundDesk, line: &str) -> Option<u32> {
        desk.sheet()
            .and_then(|sheet| sheet.item(&OrderLineId::new(line)))
            .map(ReturnItem::return_qty)
    }

    #[tokio::test]
    async fn bare_line_returns_all_units_even_when_repeated() -> TestResult {
        let mut desk = desk_for_order(order_with_socks()?).await?;
        let specs: Vec<LineSpec> = vec!["b".parse()?, "b".parse()?];

        select(&mut desk, &specs)?;

        assert_eq!(returning(&desk, "b"), Some(3));

        Ok(())
    }

    #[tokio::test]
    async fn unknown_line_is_rejected() -> TestResult {
        let mut desk = desk_for_order(order_with_socks()?).await?;
        let specs: Vec<LineSpec> = vec!["z:1".parse()?];

        assert!(select(&mut desk, &specs).is_err());

        Ok(())
    }

    fn order_with_socks() -> TestResult<Order> {
        Ok(serde_json::from_str(
            r#"{
                "id": 1042,
                "items": [
                    { "id": "a", "productId": 7, "productName": "Linen Shirt", "quantity": 1, "price": 599 },
                    { "id": "b", "productId": 9, "productName": "Socks", "quantity": 3, "price": 99 }
                ],
                "totalAmount": 896
            }"#,
        )?)
    }

    #[test]
    fn line_spec_parses_optional_quantity() {
        assert_eq!(
            "a:2".parse::<LineSpec>(),
            Ok(LineSpec {
                line: OrderLineId::new("a"),
                quantity: Some(2),
            })
        );
        assert_eq!(
            "17".parse::<LineSpec>(),
            Ok(LineSpec {
                line: OrderLineId::new("17"),
                quantity: None,
            })
        );
        assert!("a:two".parse::<LineSpec>().is_err());
    }
}
