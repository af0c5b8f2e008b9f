mod cli;
mod console;
mod report;

use pet_adoption::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
