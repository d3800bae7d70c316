#[tokio::main]
async fn main() -> anyhow::Result<()> {
    roster_cli::main_entry().await
}
