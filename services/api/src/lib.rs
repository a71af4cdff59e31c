mod cli;
mod estimate;
mod infra;
mod routes;
mod server;

use sourcer::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
