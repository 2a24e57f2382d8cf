use std::{io, num::NonZeroU32, str::FromStr, time::Instant};

use clap::Args;
use humanize_duration::{Truncate, prelude::DurationExt};
use till::{cart::Discount, customers::CustomerSelection, orders::PaymentMethod, receipt::Receipt};
use till_app::terminal::Terminal;

use super::Runtime;

/// A product code with an optional quantity, written `SKU` or `SKU:QTY`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ItemSpec {
    pub(crate) code: String,
    pub(crate) quantity: NonZeroU32,
}

impl FromStr for ItemSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (code, quantity) = match s.rsplit_once(':') {
            Some((code, quantity)) => (
                code,
                quantity
                    .trim()
                    .parse()
                    .map_err(|_err| format!("invalid quantity in `{s}`"))?,
            ),
            None => (s, NonZeroU32::MIN),
        };

        let code = code.trim();

        if code.is_empty() {
            return Err(format!("missing product code in `{s}`"));
        }

        Ok(Self {
            code: code.to_string(),
            quantity,
        })
    }
}

#[derive(Debug, Args)]
pub(crate) struct SellArgs {
    /// Item to sell as SKU or SKU:QTY; repeat for more items
    #[arg(short, long = "item", required = true)]
    items: Vec<ItemSpec>,

    /// Customer id, or `walk-in`
    #[arg(short, long, default_value = "walk-in")]
    customer: CustomerSelection,

    /// Payment method (cash, card, upi)
    #[arg(short, long, default_value = "cash")]
    payment: PaymentMethod,

    /// Discount as an amount (150) or a percentage (10%)
    #[arg(short, long)]
    discount: Option<Discount>,

    /// Note printed on the receipt
    #[arg(short, long)]
    note: Option<String>,
}

/// Adds every item to the terminal's cart, stopping at the first unknown product.
pub(crate) fn add_items(terminal: &mut Terminal, items: &[ItemSpec]) -> Result<(), String> {
    for item in items {
        terminal
            .add_product_by_sku(&item.code, item.quantity)
            .map_err(|error| format!("failed to add {}: {error}", item.code))?;
    }

    Ok(())
}

pub(crate) fn print_receipt(receipt: &Receipt, runtime: &Runtime) -> Result<(), String> {
    receipt
        .write_to(io::stdout().lock(), runtime.currency())
        .map_err(|error| format!("failed to print receipt: {error}"))
}

pub(crate) async fn run(args: SellArgs, runtime: &Runtime) -> Result<(), String> {
    let started = Instant::now();
    let mut terminal = runtime.terminal()?;

    terminal
        .load(runtime.cancel())
        .await
        .map_err(|error| format!("failed to load catalog: {error}"))?;

    add_items(&mut terminal, &args.items)?;

    terminal
        .select_customer(args.customer)
        .map_err(|error| error.to_string())?;

    let cart = terminal.cart_mut();

    cart.set_payment_method(args.payment);

    if let Some(discount) = args.discount {
        cart.set_discount(discount);
    }

    if let Some(note) = args.note {
        cart.set_note(note);
    }

    let receipt = terminal
        .checkout(runtime.cancel())
        .await
        .map_err(|error| format!("checkout failed: {error}"))?;

    print_receipt(&receipt, runtime)?;

    println!("completed in {}", started.elapsed().human(Truncate::Nano));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_spec_parses_code_and_quantity() {
        assert_eq!(
            "SH-001:3".parse::<ItemSpec>(),
            Ok(ItemSpec {
                code: "SH-001".to_string(),
                quantity: NonZeroU32::new(3).unwrap_or(NonZeroU32::MIN),
            })
        );
        assert_eq!(
            "JN-002".parse::<ItemSpec>().map(|item| item.quantity),
            Ok(NonZeroU32::MIN)
        );
        assert!("SH-001:0".parse::<ItemSpec>().is_err());
        assert!(":2".parse::<ItemSpec>().is_err());
    }
}
