#[tokio::main]
async fn main() {
    trustx::start(std::env::args()).await;
}
