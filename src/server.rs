use std::net::UdpSocket;

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::dns_message::DnsMessage;
use crate::error::DnsError;
use crate::forwarder::{forward, parse_resolver_addr};
use crate::local::add_static_answers;

/// Largest UDP payload this server reads or writes.
const MAX_DATAGRAM_LEN: usize = 512;

/// Single-threaded UDP DNS server.
///
/// Each inbound datagram is fully decoded, resolved, and answered before
/// the next one is read. When forwarding, the same connected upstream
/// socket is reused for every sub-query over the process lifetime.
pub struct DnsServer {
    socket: UdpSocket,
    upstream: Option<UdpSocket>,
}

impl DnsServer {
    /// Bind the listening socket and, when a resolver is configured,
    /// validate its address and connect the long-lived upstream socket.
    /// Any failure here is fatal to startup.
    pub fn new(bind_addr: &str, resolver: Option<&str>) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(bind_addr)
            .with_context(|| format!("failed to bind to {bind_addr}"))?;

        let upstream = match resolver {
            Some(addr) => {
                let peer = parse_resolver_addr(addr)?;
                let upstream =
                    UdpSocket::bind("0.0.0.0:0").context("failed to bind upstream socket")?;
                upstream
                    .connect(peer)
                    .with_context(|| format!("failed to connect to resolver {peer}"))?;
                info!(%peer, "forwarding questions upstream");
                Some(upstream)
            }
            None => None,
        };

        Ok(Self { socket, upstream })
    }

    /// Serve until the listening socket itself fails. A failure on a
    /// single datagram drops that datagram and keeps the loop alive.
    pub fn run(&mut self) {
        let mut buf = [0u8; MAX_DATAGRAM_LEN];

        loop {
            let (len, source) = match self.socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(e) => {
                    warn!(error = %e, "failed to receive datagram");
                    break;
                }
            };
            debug!(%source, len, "received query");

            match self.handle(&buf[..len]) {
                Ok(response) => {
                    if let Err(e) = self.socket.send_to(&response, source) {
                        warn!(%source, error = %e, "failed to send response");
                    }
                }
                Err(e) => warn!(%source, error = %e, "dropping request"),
            }
        }
    }

    /// Decode one request, fill the answer section from the upstream or
    /// the static generator, and serialize the response.
    fn handle(&mut self, frame: &[u8]) -> Result<Vec<u8>, DnsError> {
        let request = DnsMessage::decode(frame)?;
        let mut response = DnsMessage::response_skeleton(&request);

        match self.upstream.as_mut() {
            Some(upstream) => {
                let answers = forward(&request.questions, upstream)?;
                response.header.set_ancount(answers.len() as u16);
                response.answers = answers;
            }
            None => add_static_answers(&mut response),
        }

        response.serialize()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::dns_header::DnsHeader;
    use crate::dns_label::DomainName;
    use crate::dns_record::{Question, CLASS_IN, TYPE_A};

    fn raw_query(id: u16, name: &str) -> Vec<u8> {
        let mut header = DnsHeader::new();
        header.set_id(id);
        header.set_rd();
        header.set_qdcount(1);

        let request = DnsMessage {
            header,
            questions: vec![Question {
                name: DomainName::from(name),
                qtype: TYPE_A,
                qclass: CLASS_IN,
            }],
            answers: Vec::new(),
        };
        request.serialize().unwrap()
    }

    #[test]
    fn test_static_mode_answers_raw_query() {
        let mut server = DnsServer::new("127.0.0.1:0", None).unwrap();

        let frame = server.handle(&raw_query(0x1234, "codecrafters.io")).unwrap();
        let response = DnsMessage::decode(&frame).unwrap();

        assert!(response.header.qr());
        assert_eq!(response.header.id(), 0x1234);
        assert_eq!(response.header.rcode(), 0);
        assert_eq!(response.header.qdcount(), 1);
        assert_eq!(response.header.ancount(), 1);

        let answer = &response.answers[0];
        assert_eq!(answer.name, DomainName::from("codecrafters.io"));
        assert_eq!(answer.rtype, TYPE_A);
        assert_eq!(answer.rclass, CLASS_IN);
        assert_eq!(answer.ttl, 60);
        assert_eq!(answer.rdata, vec![8, 8, 8, 8]);
    }

    #[test]
    fn test_static_mode_drops_undecodable_frame() {
        let mut server = DnsServer::new("127.0.0.1:0", None).unwrap();
        let result = server.handle(&[0u8; 11]);
        assert!(matches!(result, Err(DnsError::MalformedHeader)));
    }

    #[test]
    fn test_forwarder_mode_round_trips_through_upstream() {
        let upstream = UdpSocket::bind("127.0.0.1:0").unwrap();
        let upstream_addr = upstream.local_addr().unwrap();

        // a one-shot upstream that answers whatever it is asked
        let fake_upstream = thread::spawn(move || {
            let mut buf = [0u8; MAX_DATAGRAM_LEN];
            let (len, peer) = upstream.recv_from(&mut buf).unwrap();
            let query = DnsMessage::decode(&buf[..len]).unwrap();

            let mut reply = DnsMessage::response_skeleton(&query);
            add_static_answers(&mut reply);
            upstream
                .send_to(&reply.serialize().unwrap(), peer)
                .unwrap();
            query
        });

        let mut server =
            DnsServer::new("127.0.0.1:0", Some(&upstream_addr.to_string())).unwrap();

        let frame = server.handle(&raw_query(0x77AA, "example.com")).unwrap();
        let response = DnsMessage::decode(&frame).unwrap();

        let forwarded = fake_upstream.join().unwrap();
        assert_eq!(forwarded.header.qdcount(), 1);
        assert!(forwarded.header.rd());
        assert_eq!(forwarded.questions[0].name, DomainName::from("example.com"));

        assert_eq!(response.header.id(), 0x77AA);
        assert_eq!(response.header.ancount(), 1);
        assert_eq!(response.answers[0].rdata, vec![8, 8, 8, 8]);
    }
}
