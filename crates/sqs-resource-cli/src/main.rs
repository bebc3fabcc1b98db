use sqs_resource_cli::run_cli;

#[tokio::main]
async fn main() {
    if let Err(e) = run_cli().await {
        // Logging may not be initialized yet, so report directly
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
