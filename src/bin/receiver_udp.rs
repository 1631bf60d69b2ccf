use std::fs;
use std::net::UdpSocket;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use log::{error, info};

const IDLE_TIMEOUT: Duration = Duration::from_secs(5);

fn run(port: u16, output_file: &str) -> std::io::Result<()> {
    let socket = UdpSocket::bind(("0.0.0.0", port))?;
    info!("receiver_udp: listening on port {port}");

    let start = Instant::now();
    let data = srudp::baseline::udp_recv(&socket, IDLE_TIMEOUT)?;
    fs::write(output_file, &data)?;

    info!(
        "receiver_udp: received {} bytes in {:.3}s (no loss detection — see `receiver` for the real protocol)",
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
            eprintln!("usage: receiver_udp <udp_port> <output_file>");
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
            error!("receiver_udp: {e}");
            ExitCode::FAILURE
        }
    }
}
