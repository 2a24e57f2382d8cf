use rusty_money::iso::Currency;
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};
use till::{
    cart::{Cart, Totals},
    money,
};

/// Renders rows under a bold header, right-aligning columns from `numeric_from` on.
pub(crate) fn table<const N: usize>(
    header: [&str; N],
    rows: impl IntoIterator<Item = [String; N]>,
    numeric_from: usize,
) -> String {
    let mut builder = Builder::default();

    builder.push_record(header);

    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(numeric_from..), Alignment::right());

    table.to_string()
}

pub(crate) fn amount(minor: i64, currency: &'static Currency) -> String {
    money::display(minor, currency).to_string()
}

pub(crate) fn cart(cart: &Cart, currency: &'static Currency) -> Result<String, String> {
    let totals = cart
        .totals()
        .map_err(|error| format!("failed to total cart: {error}"))?;

    let lines = table(
        ["Product", "Item", "Qty", "Price", "Subtotal"],
        cart.lines().iter().map(|line| {
            [
                line.product_id().to_string(),
                line.product().name.clone(),
                line.quantity().to_string(),
                amount(line.unit_price(), currency),
                amount(line.subtotal(), currency),
            ]
        }),
        2,
    );

    Ok(format!("{lines}\n{}", summary(&totals, currency)))
}

pub(crate) fn summary(totals: &Totals, currency: &'static Currency) -> String {
    let mut rows = vec![("Subtotal", totals.subtotal)];

    if totals.discount != 0 {
        rows.push(("Discount", -totals.discount));
    }

    if totals.tax != 0 {
        rows.push(("Tax", totals.tax));
    }

    rows.push(("Total", totals.total));

    rows.into_iter()
        .map(|(label, minor)| format!(" {label:<10}{:>14}", amount(minor, currency)))
        .collect::<Vec<_>>()
        .join("\n")
}
