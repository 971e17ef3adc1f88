#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = portal_submissions::run().await {
        eprintln!("portal-submissions fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
