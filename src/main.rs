#[tokio::main]
async fn main() -> anyhow::Result<()> {
    karaoke_studio_lib::run().await
}
