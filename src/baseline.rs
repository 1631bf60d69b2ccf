//! Trivial throughput-comparison baselines: a plain TCP byte-pump and a
//! plain unsequenced UDP byte-pump. Neither does any sequencing,
//! acknowledgment, or windowing — reliability (or its absence) here comes
//! entirely from the substrate. §4.6-4.7.

use std::io::{self, Read, Write};
use std::net::{TcpStream, UdpSocket};

use crate::codec::CHUNK;

/// Push `data` over an already-connected TCP stream in `CHUNK`-sized
/// writes, then shut down the write half. TCP's own reliability and
/// ordering make any application-level sequencing redundant.
pub fn tcp_send(stream: &mut TcpStream, data: &[u8]) -> io::Result<()> {
    for chunk in data.chunks(CHUNK) {
        stream.write_all(chunk)?;
    }
    stream.shutdown(std::net::Shutdown::Write)
}

/// Read a TCP stream to EOF into a single buffer.
pub fn tcp_recv(stream: &mut TcpStream) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Fire `data` at `peer` as a sequence of `CHUNK`-sized datagrams, back to
/// back, with no pacing, no sequence numbers, and no retransmission. Loss
/// and reordering on the wire are visible directly in the receiver's
/// output — that is the point of this baseline.
pub fn udp_send(socket: &UdpSocket, peer: std::net::SocketAddr, data: &[u8]) -> io::Result<()> {
    for chunk in data.chunks(CHUNK) {
        socket.send_to(chunk, peer)?;
    }
    Ok(())
}

/// Collect datagrams into a buffer in arrival order until `idle_timeout`
/// passes with nothing received.
pub fn udp_recv(
    socket: &UdpSocket,
    idle_timeout: std::time::Duration,
) -> io::Result<Vec<u8>> {
    socket.set_read_timeout(Some(idle_timeout))?;
    let mut output = Vec::new();
    let mut buf = [0u8; CHUNK];
    loop {
        match socket.recv(&mut buf) {
            Ok(n) => output.extend_from_slice(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut => {
                break
            }
            Err(e) => return Err(e),
        }
    }
    Ok(output)
}
