#[tokio::main]
async fn main() {
    if let Err(e) = dermsight_lib::run().await {
        eprintln!("dermsight: {e}");
        std::process::exit(1);
    }
}
