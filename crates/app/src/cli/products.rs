use clap::Args;
use till::products::Catalog;
use till_app::api::cancellable;

use super::{Runtime, render};

#[derive(Debug, Args)]
pub(crate) struct ProductsArgs {
    /// Only list products whose name, SKU or brand contains this text
    #[arg(short, long)]
    search: Option<String>,
}

pub(crate) async fn run(args: ProductsArgs, runtime: &Runtime) -> Result<(), String> {
    let store_id = runtime
        .config()
        .store_id()
        .map_err(|error| error.to_string())?;

    let products = cancellable(
        runtime.cancel(),
        runtime.services().catalog.list_products(store_id),
    )
    .await
    .map_err(|error| format!("failed to load products: {error}"))?;

    let catalog = Catalog::new(products);
    let term = args.search.unwrap_or_default();
    let matches = catalog.search(&term);

    if matches.is_empty() {
        println!("no products found");
        return Ok(());
    }

    let currency = runtime.currency();

    println!(
        "{}",
        render::table(
            ["SKU", "Name", "Brand", "Price", "MRP"],
            matches.into_iter().map(|product| {
                [
                    product.sku.clone(),
                    product.name.clone(),
                    product.brand.clone().unwrap_or_default(),
                    render::amount(product.price, currency),
                    render::amount(product.mrp, currency),
                ]
            }),
            3,
        )
    );

    Ok(())
}
