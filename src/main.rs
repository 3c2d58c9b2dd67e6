//! linehook: webhook receiver binary.

#[tokio::main]
async fn main() {
    if let Err(error) = linehook::web::run().await {
        linehook::tlog!("linehook: {}", error);
        std::process::exit(1);
    }
}
