use tailcode_client::run_cli;
use tailcode_client::util::shutdown::SHUTDOWN;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            SHUTDOWN.cancel();
        }
    });

    let code = run_cli().await?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
