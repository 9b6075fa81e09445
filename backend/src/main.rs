#[tokio::main]
async fn main() -> anyhow::Result<()> {
    kos::start_server().await
}
