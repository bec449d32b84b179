use crate::report::{
    run_commission, run_mortgage, run_provinces, run_rates, run_stamp_duty, CommissionArgs,
    MortgageArgs, StampDutyArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use realtor_finance::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Realtor Finance",
    about = "Commission, stamp-duty and mortgage calculators for real-estate agents",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Net commission after taxes for a single sale
    Commission(CommissionArgs),
    /// Stamp duty (sellos) owed on a sale amount
    StampDuty(StampDutyArgs),
    /// Fixed-installment mortgage simulation
    Mortgage(MortgageArgs),
    /// List provinces and their default stamp-duty rates
    Provinces,
    /// List bank mortgage rates on record
    Rates,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Commission(args) => run_commission(args),
        Command::StampDuty(args) => run_stamp_duty(args),
        Command::Mortgage(args) => run_mortgage(args).await,
        Command::Provinces => run_provinces(),
        Command::Rates => run_rates(),
    }
}
