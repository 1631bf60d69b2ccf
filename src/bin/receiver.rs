use std::fs;
use std::net::UdpSocket;
use std::process::ExitCode;
use std::time::Instant;

use log::{error, info};

use srudp::handshake::{self, HandshakeConfig, DEFAULT_WINDOW};
use srudp::receiver::{self, ReceiverConfig};
use srudp::transport::UdpTransport;
use srudp::Error;

struct Args {
    port: u16,
    output_file: String,
    original_file: String,
}

fn parse_args() -> Result<Args, String> {
    let mut args = std::env::args().skip(1);
    let port = args.next().ok_or("missing <udp_port>")?;
    let output_file = args.next().ok_or("missing <output_file>")?;
    let original_file = args.next().ok_or("missing <original_file>")?;
    if args.next().is_some() {
        return Err("too many arguments".to_string());
    }

    let port: u16 = port.parse().map_err(|_| format!("invalid port: {port}"))?;

    Ok(Args {
        port,
        output_file,
        original_file,
    })
}

fn run(args: Args) -> Result<(), Error> {
    // Read only for the reference length used in the loss-rate report —
    // never for content (§6).
    let original_size = fs::metadata(&args.original_file)?.len();

    let socket = UdpSocket::bind(("0.0.0.0", args.port))?;
    info!("receiver: listening on port {}", args.port);
    let mut transport = UdpTransport::new(socket);

    let (negotiated_window, _peer) =
        handshake::receiver_handshake(&mut transport, DEFAULT_WINDOW, &HandshakeConfig::default())?;
    info!(
        "receiver: handshake complete, window_size={}",
        negotiated_window
    );

    let start = Instant::now();
    let (output, stats) = receiver::run(&mut transport, negotiated_window, &ReceiverConfig::default())?;
    let elapsed = start.elapsed();

    fs::write(&args.output_file, &output)?;

    info!(
        "receiver: transfer complete in {:.3}s — {} packets, {} acks sent, {} duplicates, {} out-of-order, loss={:.2}%",
        elapsed.as_secs_f64(),
        stats.packets_received,
        stats.acks_sent,
        stats.duplicate_packets,
        stats.out_of_order_packets,
        stats.loss_rate(original_size),
    );

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("usage: receiver <udp_port> <output_file> <original_file>");
            eprintln!("error: {msg}");
            return ExitCode::FAILURE;
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("receiver: {e}");
            ExitCode::FAILURE
        }
    }
}
