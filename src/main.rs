#[tokio::main]
async fn main() -> statusflare::Result<()> {
    statusflare::telemetry::init();

    statusflare::run().await
}
