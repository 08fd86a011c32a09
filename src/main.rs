use topoplan::cli::display::print_error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    // Library crates log through `log`; the fmt subscriber picks those up too.
    // Logs go to stderr so `plan --output json` stays pipeable.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = topoplan::cli::run().await {
        print_error(&format!("Error: {}", e));
        std::process::exit(1);
    }
}
