use std::fs;
use std::net::UdpSocket;
use std::process::ExitCode;
use std::time::Instant;

use log::{error, info};

fn run(file_path: &str, receiver_ip: &str, port: u16) -> std::io::Result<()> {
    let data = fs::read(file_path)?;
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    let peer = format!("{receiver_ip}:{port}")
        .parse()
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "bad receiver address"))?;

    let start = Instant::now();
    srudp::baseline::udp_send(&socket, peer, &data)?;
    info!(
        "sender_udp: fired {} bytes in {:.3}s (no reliability — see `sender` for the real protocol)",
        data.len(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let (file_path, receiver_ip, port) = match (args.next(), args.next(), args.next()) {
        (Some(f), Some(ip), Some(p)) => (f, ip, p),
        _ => {
            eprintln!("usage: sender_udp <file_path> <receiver_ip> <udp_port>");
            return ExitCode::FAILURE;
        }
    };
    let Ok(port) = port.parse() else {
        eprintln!("error: invalid port: {port}");
        return ExitCode::FAILURE;
    };

    match run(&file_path, &receiver_ip, port) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("sender_udp: {e}");
            ExitCode::FAILURE
        }
    }
}
