#[tokio::main]
async fn main() -> std::io::Result<()> {
    blastgrid_server::frameworks::server::run_with_config().await
}
