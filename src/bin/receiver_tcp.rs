use std::fs;
use std::net::TcpListener;
use std::process::ExitCode;
use std::time::Instant;

use log::{error, info};

fn run(port: u16, output_file: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port))?;
    info!("receiver_tcp: listening on port {port}");

    let (mut stream, peer) = listener.accept()?;
    info!("receiver_tcp: accepted connection from {peer}");

    let start = Instant::now();
    let data = srudp::baseline::tcp_recv(&mut stream)?;
    fs::write(output_file, &data)?;

    info!(
        "receiver_tcp: received {} bytes in {:.3}s",
        data.len(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let (port, output_file) = match (args.next(), args.next()) {
        (Some(p), Some(f)) => (p, f),
        _ => {
            eprintln!("usage: receiver_tcp <tcp_port> <output_file>");
            return ExitCode::FAILURE;
        }
    };
    let Ok(port) = port.parse() else {
        eprintln!("error: invalid port: {port}");
        return ExitCode::FAILURE;
    };

    match run(port, &output_file) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("receiver_tcp: {e}");
            ExitCode::FAILURE
        }
    }
}
