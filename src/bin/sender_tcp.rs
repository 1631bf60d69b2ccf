use std::fs;
use std::net::TcpStream;
use std::process::ExitCode;
use std::time::Instant;

use log::{error, info};

fn run(file_path: &str, receiver_ip: &str, port: u16) -> std::io::Result<()> {
    let data = fs::read(file_path)?;
    let mut stream = TcpStream::connect((receiver_ip, port))?;

    let start = Instant::now();
    srudp::baseline::tcp_send(&mut stream, &data)?;
    info!(
        "sender_tcp: sent {} bytes in {:.3}s",
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
            eprintln!("usage: sender_tcp <file_path> <receiver_ip> <tcp_port>");
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
            error!("sender_tcp: {e}");
            ExitCode::FAILURE
        }
    }
}
