use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    retrace_cli::cli::run().await
}
