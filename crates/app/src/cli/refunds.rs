use clap::Args;
use till::refunds::{Refund, RefundId};
use till_app::api::cancellable;

use super::{Runtime, render};

#[derive(Debug, Args)]
pub(crate) struct RefundsArgs {
    /// Show a single refund
    #[arg(long)]
    id: Option<RefundId>,
}

pub(crate) async fn run(args: RefundsArgs, runtime: &Runtime) -> Result<(), String> {
    let refunds = match args.id {
        Some(id) => vec![
            cancellable(runtime.cancel(), runtime.services().refunds.get_refund(id))
                .await
                .map_err(|error| format!("failed to load refund: {error}"))?,
        ],
        None => {
            let cashier_id = runtime
                .config()
                .cashier_id()
                .map_err(|error| error.to_string())?;

            let mut desk = runtime.refund_desk();

            desk.refund_history(cashier_id, runtime.cancel())
                .await
                .map_err(|error| format!("failed to load refunds: {error}"))?
                .to_vec()
        }
    };

    if refunds.is_empty() {
        println!("no refunds found");
        return Ok(());
    }

    let currency = runtime.currency();

    println!(
        "{}",
        render::table(
            ["Refund", "Order", "Customer", "Reason", "Recorded", "Amount"],
            refunds.iter().map(|refund| {
                [
                    refund.id.to_string(),
                    order_label(refund),
                    refund.customer_name().unwrap_or("Walk-in").to_string(),
                    refund.reason.clone(),
                    refund
                        .created_at
                        .map(|at| at.strftime("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default(),
                    render::amount(refund.amount, currency),
                ]
            }),
            5,
        )
    );

    Ok(())
}

fn order_label(refund: &Refund) -> String {
    refund
        .order_number()
        .map(str::to_string)
        .or_else(|| refund.refunded_order().map(ToString::to_string))
        .unwrap_or_default()
}
