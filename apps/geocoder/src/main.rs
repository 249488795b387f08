use geocoder::adapter::run_stdio;
use geocoder::supervisor::install_panic_hook;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    install_panic_hook();

    let status = run_stdio().await;

    std::process::exit(status);
}
