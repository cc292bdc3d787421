use albumstore::config::Config;
use albumstore::{server, Error};
use clap::Parser;
use tracing::error;

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = Config::parse();

    if let Err(err) = server::run(config).await {
        error!("Server exited with error: {}", err);
        return Err(err);
    }

    Ok(())
}
