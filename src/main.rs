use dotenv::dotenv;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<(), soundtrack::Error> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("soundtrack=debug,warn")),
        )
        .with_target(true)
        .with_ansi(true)
        .init();

    dotenv().ok();

    soundtrack::run().await
}
