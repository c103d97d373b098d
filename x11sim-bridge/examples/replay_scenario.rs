use anyhow::{Context, Result};
use tokio::net::TcpStream;
use x11sim_bridge::{draw_scene, export_reference, load_trace_file, SimSession, SimulatorConfig};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let server_addr =
        std::env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:6000".to_string());
    let observed_path = std::env::var("OBSERVED_TRACE").ok();
    let reference_path = std::env::var("REFERENCE_OUT").ok();

    eprintln!("Connecting to {}...", server_addr);
    let stream = TcpStream::connect(&server_addr)
        .await
        .with_context(|| format!("failed to connect to {}", server_addr))?;
    stream.set_nodelay(true)?;

    let mut session = SimSession::connect(stream, SimulatorConfig::default())
        .await
        .context("connection setup failed")?;
    let setup = session.setup();
    eprintln!(
        "Established: protocol {}.{}",
        setup.protocol_major, setup.protocol_minor
    );

    draw_scene(&mut session).await.context("scene aborted")?;

    if let Some(path) = &reference_path {
        export_reference(session.operations(), path)?;
    }

    let report = match &observed_path {
        Some(path) => {
            let observed = load_trace_file(path)?;
            Some(session.compare(&observed))
        },
        None => None,
    };

    let summary = session.finish().await;
    println!(
        "{} operations, {} validation issues",
        summary.record.operations.len(),
        summary.record.issues.len()
    );
    for issue in &summary.record.issues {
        println!("  issue: {}", issue);
    }
    if let Some(stats) = summary.reader_stats {
        println!(
            "reader: {} replies, {} events, {} errors",
            stats.replies, stats.events, stats.errors
        );
    }
    if let Some(err) = summary.reader_error {
        println!("reader failed: {}", err);
    }

    match report {
        Some(report) => {
            println!("{}", report);
            if !report.passed() {
                std::process::exit(1);
            }
        },
        None => println!("no OBSERVED_TRACE given, skipping comparison"),
    }
    Ok(())
}
