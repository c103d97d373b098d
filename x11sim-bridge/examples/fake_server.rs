use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use x11sim_bridge::FakeServer;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let listen_addr =
        std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "127.0.0.1:6000".to_string());
    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", listen_addr))?;
    println!("Fake display server listening on {}", listen_addr);

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal.cancel();
        }
    });

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                log::info!("shutdown requested");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                log::info!("connection from {}", peer);
                tokio::spawn(async move {
                    match FakeServer::default().serve(stream).await {
                        Ok(requests) => log::info!("{} sent {} requests", peer, requests.len()),
                        Err(e) => log::error!("connection {} failed: {}", peer, e),
                    }
                });
            }
        }
    }
}
