use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    slotscan_daemon::run().await
}
