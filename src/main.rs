//! Service entry point.

#[tokio::main]
async fn main() {
    platter::start_server().await;
}
