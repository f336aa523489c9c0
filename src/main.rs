use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    stock_monitoring::cli::run(std::env::args().skip(1))
}
