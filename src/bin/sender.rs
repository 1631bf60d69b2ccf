use std::fs;
use std::net::{SocketAddr, UdpSocket};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use log::{error, info};

use srudp::handshake::{self, HandshakeConfig, DEFAULT_WINDOW};
use srudp::sender::{self, SenderConfig};
use srudp::transport::UdpTransport;
use srudp::Error;

struct Args {
    file_path: String,
    receiver_addr: SocketAddr,
}

fn parse_args() -> Result<Args, String> {
    let mut args = std::env::args().skip(1);
    let file_path = args.next().ok_or("missing <file_path>")?;
    let receiver_ip = args.next().ok_or("missing <receiver_ip>")?;
    let port = args.next().ok_or("missing <udp_port>")?;
    if args.next().is_some() {
        return Err("too many arguments".to_string());
    }

    let port: u16 = port.parse().map_err(|_| format!("invalid port: {port}"))?;
    let receiver_addr: SocketAddr = format!("{receiver_ip}:{port}")
        .parse()
        .map_err(|_| format!("invalid receiver address: {receiver_ip}:{port}"))?;

    Ok(Args {
        file_path,
        receiver_addr,
    })
}

fn run(args: Args) -> Result<(), Error> {
    let file_data = fs::read(&args.file_path)?;
    info!(
        "sender: loaded {} bytes from {}",
        file_data.len(),
        args.file_path
    );

    let socket = UdpSocket::bind("0.0.0.0:0")?;
    let mut transport = UdpTransport::new(socket);

    let start = Instant::now();
    let negotiated_window = handshake::sender_handshake(
        &mut transport,
        args.receiver_addr,
        DEFAULT_WINDOW,
        &HandshakeConfig::default(),
    )?;
    info!("sender: handshake complete, window_size={}", negotiated_window);

    let stats = sender::run(
        &mut transport,
        args.receiver_addr,
        &file_data,
        negotiated_window,
        &SenderConfig::default(),
    )?;

    let elapsed = start.elapsed();
    info!(
        "sender: transfer complete in {:.3}s — {} packets, {} acks, {} retransmissions ({:.2}%), {:.2} MB/s",
        elapsed.as_secs_f64(),
        stats.total_packets,
        stats.acks_received,
        stats.retransmissions,
        stats.retransmission_rate(),
        mb_per_sec(stats.bytes_sent, elapsed),
    );

    Ok(())
}

fn mb_per_sec(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs == 0.0 {
        0.0
    } else {
        (bytes as f64 / 1024.0 / 1024.0) / secs
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("usage: sender <file_path> <receiver_ip> <udp_port>");
            eprintln!("error: {msg}");
            return ExitCode::FAILURE;
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("sender: {e}");
            ExitCode::FAILURE
        }
    }
}
