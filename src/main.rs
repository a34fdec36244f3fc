use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use rust_decimal::Decimal;
use taxrate::cli::rate::parse_price;
use taxrate::core::Address;
use taxrate::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Resolve the tax rate for one or more destinations
    Rate {
        /// Destination as COUNTRY,STATE,CITY,ZIP (repeatable)
        #[arg(short, long = "address", required = true)]
        addresses: Vec<Address>,

        /// Taxable amount of the order
        #[arg(short, long, default_value = "100", value_parser = parse_price)]
        price: Decimal,
    },
    /// Test tax calculation against the configured test address
    Test {
        /// Destination as COUNTRY,STATE,CITY,ZIP
        #[arg(short, long)]
        address: Option<Address>,
    },
}

impl From<Commands> for taxrate::AppCommand {
    fn from(cmd: Commands) -> taxrate::AppCommand {
        match cmd {
            Commands::Rate { addresses, price } => taxrate::AppCommand::Rate { addresses, price },
            Commands::Test { address } => taxrate::AppCommand::Test { address },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => taxrate::cli::setup::setup(),
        Some(cmd) => taxrate::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
