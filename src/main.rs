#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cohortly::bootstrapper::run().await
}
