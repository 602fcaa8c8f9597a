#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    word_sync::run().await
}
