mod cli;
mod infra;
mod report;
mod routes;
mod server;

use realtor_finance::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
