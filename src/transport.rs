//! A thin datagram abstraction so the handshake, sender, and receiver state
//! machines can run against a real [`std::net::UdpSocket`] in production and
//! against an in-memory, adversarially-scheduled channel in tests — a
//! pure-state-machine/IO-loop split, so the protocol logic is testable
//! without a socket.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

/// Result of a timed receive: either a datagram arrived, or the deadline
/// elapsed with nothing to report.
pub enum RecvOutcome {
    Datagram { bytes: Vec<u8>, from: SocketAddr },
    TimedOut,
}

/// Everything the protocol needs from a datagram socket.
pub trait Datagram {
    fn send_to(&mut self, buf: &[u8], to: SocketAddr) -> io::Result<()>;

    /// Block for at most `timeout` waiting for one datagram.
    fn recv(&mut self, timeout: Duration) -> io::Result<RecvOutcome>;
}

/// Production transport: a bound [`UdpSocket`].
pub struct UdpTransport {
    socket: UdpSocket,
    buf: [u8; 2048],
}

impl UdpTransport {
    pub fn new(socket: UdpSocket) -> Self {
        UdpTransport {
            socket,
            buf: [0u8; 2048],
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl Datagram for UdpTransport {
    fn send_to(&mut self, buf: &[u8], to: SocketAddr) -> io::Result<()> {
        self.socket.send_to(buf, to)?;
        Ok(())
    }

    fn recv(&mut self, timeout: Duration) -> io::Result<RecvOutcome> {
        self.socket.set_read_timeout(Some(timeout))?;
        match self.socket.recv_from(&mut self.buf) {
            Ok((n, from)) => Ok(RecvOutcome::Datagram {
                bytes: self.buf[..n].to_vec(),
                from,
            }),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut => {
                Ok(RecvOutcome::TimedOut)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_util {
    //! An in-memory, single-direction-at-a-time datagram channel used to
    //! drive the sender/receiver state machines under adversarial delivery
    //! schedules (drop, duplicate, reorder) without a real socket. Backed
    //! by `Arc<Mutex<_>>` rather than `Rc<RefCell<_>>` so a sender and
    //! receiver can be driven from two real threads the way the two
    //! processes would run in production.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Condvar, Mutex};

    struct Queued {
        bytes: Vec<u8>,
        from: SocketAddr,
    }

    #[derive(Default)]
    struct Inbox {
        queue: Mutex<VecDeque<Queued>>,
        cvar: Condvar,
    }

    impl Inbox {
        fn push(&self, item: Queued) {
            self.queue.lock().unwrap().push_back(item);
            self.cvar.notify_one();
        }

        fn pop_timeout(&self, timeout: Duration) -> Option<Queued> {
            let guard = self.queue.lock().unwrap();
            let (mut guard, _) = self
                .cvar
                .wait_timeout_while(guard, timeout, |q| q.is_empty())
                .unwrap();
            guard.pop_front()
        }
    }

    type Adversary = dyn FnMut(&[u8]) -> Vec<Vec<u8>> + Send;

    /// One endpoint of an in-memory channel. Sends go through an
    /// adversary closure (so a test can drop/duplicate/reorder at will);
    /// receives pull from this endpoint's own inbox.
    pub struct ChannelTransport {
        pub addr: SocketAddr,
        inbox: Arc<Inbox>,
        peer_inbox: Arc<Inbox>,
        on_send: Arc<Mutex<Box<Adversary>>>,
    }

    fn identity_adversary() -> Box<Adversary> {
        Box::new(|b: &[u8]| vec![b.to_vec()])
    }

    impl ChannelTransport {
        /// Build a connected pair of endpoints, `a` and `b`, each able to
        /// send to and receive from the other. Both start with an
        /// identity adversary (no manipulation); call [`set_adversary`]
        /// on whichever side a scenario needs to mangle.
        pub fn pair(addr_a: SocketAddr, addr_b: SocketAddr) -> (Self, Self) {
            let inbox_a = Arc::new(Inbox::default());
            let inbox_b = Arc::new(Inbox::default());

            let a = ChannelTransport {
                addr: addr_a,
                inbox: inbox_a.clone(),
                peer_inbox: inbox_b.clone(),
                on_send: Arc::new(Mutex::new(identity_adversary())),
            };
            let b = ChannelTransport {
                addr: addr_b,
                inbox: inbox_b,
                peer_inbox: inbox_a,
                on_send: Arc::new(Mutex::new(identity_adversary())),
            };
            (a, b)
        }

        /// Replace this endpoint's outbound adversary. The closure is
        /// called once per `send_to` with the encoded datagram and
        /// returns the list of copies that actually reach the peer's
        /// inbox (empty = dropped, >1 = duplicated).
        pub fn set_adversary(&mut self, f: impl FnMut(&[u8]) -> Vec<Vec<u8>> + Send + 'static) {
            self.on_send = Arc::new(Mutex::new(Box::new(f)));
        }
    }

    impl Datagram for ChannelTransport {
        fn send_to(&mut self, buf: &[u8], _to: SocketAddr) -> io::Result<()> {
            let copies = (self.on_send.lock().unwrap())(buf);
            for bytes in copies {
                self.peer_inbox.push(Queued {
                    bytes,
                    from: self.addr,
                });
            }
            Ok(())
        }

        fn recv(&mut self, timeout: Duration) -> io::Result<RecvOutcome> {
            match self.inbox.pop_timeout(timeout) {
                Some(Queued { bytes, from }) => Ok(RecvOutcome::Datagram { bytes, from }),
                None => Ok(RecvOutcome::TimedOut),
            }
        }
    }
}
