use clap::{Args, Subcommand};
use till::customers::NewCustomer;
use till_app::api::cancellable;

use super::{Runtime, render};

#[derive(Debug, Args)]
pub(crate) struct CustomersCommand {
    #[command(subcommand)]
    command: CustomersSubcommand,
}

#[derive(Debug, Subcommand)]
enum CustomersSubcommand {
    /// List registered customers
    List(ListCustomersArgs),

    /// Register a new customer
    Add(AddCustomerArgs),
}

#[derive(Debug, Args)]
struct ListCustomersArgs {
    /// Only list customers whose name, email or phone contains this text
    #[arg(short, long)]
    search: Option<String>,
}

#[derive(Debug, Args)]
struct AddCustomerArgs {
    /// Full name
    #[arg(long)]
    name: String,

    /// Email address
    #[arg(long)]
    email: String,

    /// Phone number
    #[arg(long)]
    phone: String,

    /// Postal address
    #[arg(long)]
    address: Option<String>,
}

pub(crate) async fn run(command: CustomersCommand, runtime: &Runtime) -> Result<(), String> {
    match command.command {
        CustomersSubcommand::List(args) => list(args, runtime).await,
        CustomersSubcommand::Add(args) => add(args, runtime).await,
    }
}

async fn list(args: ListCustomersArgs, runtime: &Runtime) -> Result<(), String> {
    let customers = cancellable(runtime.cancel(), runtime.services().catalog.list_customers())
        .await
        .map_err(|error| format!("failed to load customers: {error}"))?;

    let needle = args.search.unwrap_or_default().trim().to_lowercase();

    let rows: Vec<_> = customers
        .into_iter()
        .filter(|customer| {
            needle.is_empty()
                || customer.full_name.to_lowercase().contains(&needle)
                || customer.email.to_lowercase().contains(&needle)
                || customer.phone.contains(&needle)
        })
        .map(|customer| {
            [
                customer.id.into_string(),
                customer.full_name,
                customer.email,
                customer.phone,
            ]
        })
        .collect();

    if rows.is_empty() {
        println!("no customers found");
        return Ok(());
    }

    println!(
        "{}",
        render::table(["Id", "Name", "Email", "Phone"], rows, 4)
    );

    Ok(())
}

async fn add(args: AddCustomerArgs, runtime: &Runtime) -> Result<(), String> {
    let full_name = args.name.trim().to_string();

    if full_name.is_empty() {
        return Err("customer name cannot be empty".to_string());
    }

    let customer = cancellable(
        runtime.cancel(),
        runtime.services().catalog.create_customer(NewCustomer {
            full_name,
            email: args.email.trim().to_string(),
            phone: args.phone.trim().to_string(),
            address: args.address.filter(|address| !address.trim().is_empty()),
        }),
    )
    .await
    .map_err(|error| format!("failed to create customer: {error}"))?;

    println!("customer_id: {}", customer.id);
    println!("customer_name: {}", customer.full_name);

    Ok(())
}
