use clap::{Args, Subcommand};
use till::{
    cart::Discount, customers::CustomerSelection, orders::PaymentMethod, products::ProductId,
};
use till_app::session::Session;
use uuid::Uuid;

use super::{
    Runtime, render,
    sell::{ItemSpec, add_items, print_receipt},
};

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Show the cart and any held carts
    Show,

    /// Add items by SKU or SKU:QTY
    Add(AddArgs),

    /// Take units off a line, or remove it entirely
    Remove(RemoveArgs),

    /// Set the customer, payment method, discount or note
    Set(SetArgs),

    /// Empty the cart
    Clear,

    /// Park the cart to serve someone else
    Hold,

    /// Bring a held cart back
    Restore(RestoreArgs),

    /// Place the order for the cart
    Checkout,
}

#[derive(Debug, Args)]
struct AddArgs {
    /// Item to add as SKU or SKU:QTY; repeat for more items
    #[arg(required = true)]
    items: Vec<ItemSpec>,
}

#[derive(Debug, Args)]
struct RemoveArgs {
    /// Product id of the line
    product_id: ProductId,

    /// Units to take off; the whole line when omitted
    #[arg(short, long)]
    quantity: Option<u32>,
}

#[derive(Debug, Args)]
struct SetArgs {
    /// Customer id, or `walk-in`
    #[arg(short, long)]
    customer: Option<CustomerSelection>,

    /// Payment method (cash, card, upi)
    #[arg(short, long)]
    payment: Option<PaymentMethod>,

    /// Discount as an amount (150) or a percentage (10%); empty clears it
    #[arg(short, long)]
    discount: Option<Discount>,

    /// Order note
    #[arg(short, long)]
    note: Option<String>,
}

#[derive(Debug, Args)]
struct RestoreArgs {
    /// Held cart id
    id: Uuid,
}

pub(crate) async fn run(command: CartCommand, runtime: &Runtime) -> Result<(), String> {
    let mut session = runtime.session()?;

    match command.command {
        CartSubcommand::Show => return show(&session, runtime),
        CartSubcommand::Add(args) => {
            load(&mut session, runtime).await?;
            add_items(session.terminal_mut(), &args.items)?;
        }
        CartSubcommand::Remove(args) => remove(&mut session, &args)?,
        CartSubcommand::Set(args) => set(&mut session, args, runtime).await?,
        CartSubcommand::Clear => session.terminal_mut().cart_mut().clear(),
        CartSubcommand::Hold => {
            let id = session
                .terminal_mut()
                .hold()
                .map_err(|error| error.to_string())?;

            println!("held cart {id}");
        }
        CartSubcommand::Restore(args) => session
            .terminal_mut()
            .restore_held(args.id)
            .map_err(|error| error.to_string())?,
        CartSubcommand::Checkout => return checkout(&mut session, runtime).await,
    }

    persist(&session)?;
    show(&session, runtime)
}

async fn load(session: &mut Session, runtime: &Runtime) -> Result<(), String> {
    session
        .terminal_mut()
        .load(runtime.cancel())
        .await
        .map_err(|error| format!("failed to load catalog: {error}"))
}

fn persist(session: &Session) -> Result<(), String> {
    session
        .persist()
        .map_err(|error| format!("failed to save cart: {error}"))
}

fn remove(session: &mut Session, args: &RemoveArgs) -> Result<(), String> {
    let cart = session.terminal_mut().cart_mut();

    if cart.line(&args.product_id).is_none() {
        return Err(format!("product {} is not in the cart", args.product_id));
    }

    match args.quantity {
        Some(quantity) => cart.update_quantity(&args.product_id, -i64::from(quantity)),
        None => {
            cart.remove_line(&args.product_id);
        }
    }

    Ok(())
}

async fn set(session: &mut Session, args: SetArgs, runtime: &Runtime) -> Result<(), String> {
    if let Some(customer) = args.customer {
        if customer.customer_id().is_some() {
            load(session, runtime).await?;
        }

        session
            .terminal_mut()
            .select_customer(customer)
            .map_err(|error| error.to_string())?;
    }

    let cart = session.terminal_mut().cart_mut();

    if let Some(payment) = args.payment {
        cart.set_payment_method(payment);
    }

    if let Some(discount) = args.discount {
        cart.set_discount(discount);
    }

    if let Some(note) = args.note {
        cart.set_note(note);
    }

    Ok(())
}

async fn checkout(session: &mut Session, runtime: &Runtime) -> Result<(), String> {
    load(session, runtime).await?;

    let receipt = session
        .terminal_mut()
        .checkout(runtime.cancel())
        .await
        .map_err(|error| format!("checkout failed: {error}"))?;

    persist(session)?;
    print_receipt(&receipt, runtime)
}

fn show(session: &Session, runtime: &Runtime) -> Result<(), String> {
    let terminal = session.terminal();
    let cart = terminal.cart();

    if cart.is_empty() {
        println!("cart is empty");
    } else {
        println!("{}", render::cart(cart, runtime.currency())?);
        println!(" Customer  {}", cart.customer());
        println!(" Payment   {}", cart.payment_method());

        if !cart.note().is_empty() {
            println!(" Note      {}", cart.note());
        }
    }

    if !terminal.held().is_empty() {
        println!();
        println!(
            "{}",
            render::table(
                ["Held cart", "Held at", "Items"],
                terminal.held().iter().map(|held| {
                    [
                        held.id.to_string(),
                        held.held_at.strftime("%Y-%m-%d %H:%M").to_string(),
                        held.item_count().to_string(),
                    ]
                }),
                2,
            )
        );
    }

    Ok(())
}
