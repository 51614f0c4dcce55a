use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};

use tracing::debug;

use crate::dns_header::DnsHeader;
use crate::dns_message::DnsMessage;
use crate::dns_record::{Question, ResourceRecord};
use crate::error::DnsError;

/// Port assumed when the resolver address does not carry one.
const DEFAULT_DNS_PORT: u16 = 53;

/// One request/response exchange against a peer fixed at construction
/// time. The server hands in its long-lived connected socket; tests hand
/// in a scripted mock.
pub trait UpstreamTransport {
    fn send(&mut self, frame: &[u8]) -> io::Result<()>;
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl UpstreamTransport for UdpSocket {
    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        UdpSocket::send(self, frame).map(|_| ())
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        UdpSocket::recv(self, buf)
    }
}

/// Resolve each question against the upstream, one exchange per question.
///
/// Questions are never batched: every one goes out as its own
/// single-question query with a fresh transaction id, and the returned
/// answers accumulate in question order. The first send, receive, or
/// decode failure aborts the whole operation. The reply's transaction id
/// is not checked against the one sent, and no timeout is applied beyond
/// the transport's own.
pub fn forward<T: UpstreamTransport>(
    questions: &[Question],
    upstream: &mut T,
) -> Result<Vec<ResourceRecord>, DnsError> {
    let mut answers = Vec::new();

    for question in questions {
        let query = build_query(question)?;
        upstream.send(&query)?;

        let mut buf = [0u8; 512];
        let len = upstream.recv(&mut buf)?;

        let reply = DnsMessage::decode(&buf[..len])?;
        debug!(name = %question.name, answers = reply.answers.len(), "upstream reply");
        answers.extend(reply.answers);
    }

    Ok(answers)
}

/// A minimal single-question query: fresh random id, RD set, QDCOUNT 1,
/// everything else zero.
fn build_query(question: &Question) -> Result<Vec<u8>, DnsError> {
    let mut header = DnsHeader::new();
    header.set_id(rand::random::<u16>());
    header.set_rd();
    header.set_qdcount(1);

    let message = DnsMessage {
        header,
        questions: vec![question.clone()],
        answers: Vec::new(),
    };

    message.serialize()
}

/// Parse an upstream resolver given as `host[:port]`. The host must be a
/// literal IPv4 address; the port defaults to 53 and must be nonzero.
pub fn parse_resolver_addr(addr: &str) -> Result<SocketAddr, DnsError> {
    let invalid = || DnsError::InvalidResolverAddress(addr.to_string());

    let (host, port) = match addr.rsplit_once(':') {
        Some((host, port)) => {
            let port: u16 = port.parse().map_err(|_| invalid())?;
            if port == 0 {
                return Err(invalid());
            }
            (host, port)
        }
        None => (addr, DEFAULT_DNS_PORT),
    };

    let host: Ipv4Addr = host.parse().map_err(|_| invalid())?;
    Ok(SocketAddr::V4(SocketAddrV4::new(host, port)))
}
