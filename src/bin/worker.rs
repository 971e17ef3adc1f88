#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = portal_submissions::run_worker().await {
        eprintln!("portal-submissions worker fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
