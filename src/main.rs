use warp::cli;

#[tokio::main]
async fn main() {
    // Errors are already reported by the CLI layer
    if cli::Cli::run().await.is_err() {
        std::process::exit(1);
    }
}
