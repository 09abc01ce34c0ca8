#[tokio::main]
async fn main() -> anyhow::Result<()> {
    posetrack::run().await
}
