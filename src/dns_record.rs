use std::net::Ipv4Addr;

use bytes::{BufMut, BytesMut};

use crate::dns_label::{DomainName, LabelCache};
use crate::error::DnsError;

/// Record type for IPv4 host addresses, the only type this server originates.
pub const TYPE_A: u16 = 1;
/// The Internet class.
pub const CLASS_IN: u16 = 1;

/// One entry of the question section: name, query type, query class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: DomainName,
    pub qtype: u16,
    pub qclass: u16,
}

impl Question {
    /// Decode a question at `cursor`, returning it with the advanced cursor.
    pub fn decode(
        frame: &[u8],
        cursor: usize,
        cache: &mut LabelCache,
    ) -> Result<(Self, usize), DnsError> {
        let (name, cursor) = DomainName::decode(frame, cursor, cache)?;

        let fields = frame
            .get(cursor..cursor + 4)
            .ok_or(DnsError::TruncatedFrame)?;
        let qtype = u16::from_be_bytes([fields[0], fields[1]]);
        let qclass = u16::from_be_bytes([fields[2], fields[3]]);

        Ok((Self { name, qtype, qclass }, cursor + 4))
    }

    /// Exact encoded size, used to pre-size response buffers.
    pub fn encoded_len(&self) -> usize {
        self.name.encoded_len() + 4
    }

    /// Append the wire form to `buf`.
    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), DnsError> {
        buf.put_slice(&self.name.encode()?);
        buf.put_u16(self.qtype);
        buf.put_u16(self.qclass);
        Ok(())
    }
}

/// A resource record; answer, authority, and additional entries all share
/// this layout on the wire.
///
/// Only A-record rdata is ever interpreted; anything else that arrives
/// from upstream is relayed as opaque bytes. RDLENGTH is derived from
/// `rdata` at encode time so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: DomainName,
    pub rtype: u16,
    pub rclass: u16,
    pub ttl: u32,
    pub rdata: Vec<u8>,
}

impl ResourceRecord {
    /// Build an A record for an IPv4 address.
    pub fn a_record(name: DomainName, ttl: u32, ip: Ipv4Addr) -> Self {
        Self {
            name,
            rtype: TYPE_A,
            rclass: CLASS_IN,
            ttl,
            rdata: ip.octets().to_vec(),
        }
    }

    /// Decode a record at `cursor`, returning it with the advanced cursor.
    pub fn decode(
        frame: &[u8],
        cursor: usize,
        cache: &mut LabelCache,
    ) -> Result<(Self, usize), DnsError> {
        let (name, cursor) = DomainName::decode(frame, cursor, cache)?;

        let fields = frame
            .get(cursor..cursor + 10)
            .ok_or(DnsError::TruncatedFrame)?;
        let rtype = u16::from_be_bytes([fields[0], fields[1]]);
        let rclass = u16::from_be_bytes([fields[2], fields[3]]);
        let ttl = u32::from_be_bytes([fields[4], fields[5], fields[6], fields[7]]);
        let rdlength = u16::from_be_bytes([fields[8], fields[9]]) as usize;

        let data_start = cursor + 10;
        let rdata = frame
            .get(data_start..data_start + rdlength)
            .ok_or(DnsError::TruncatedFrame)?
            .to_vec();

        Ok((
            Self {
                name,
                rtype,
                rclass,
                ttl,
                rdata,
            },
            data_start + rdlength,
        ))
    }

    /// Exact encoded size: name, ten fixed bytes, rdata.
    pub fn encoded_len(&self) -> usize {
        self.name.encoded_len() + 10 + self.rdata.len()
    }

    /// Append the wire form to `buf`.
    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), DnsError> {
        buf.put_slice(&self.name.encode()?);
        buf.put_u16(self.rtype);
        buf.put_u16(self.rclass);
        buf.put_u32(self.ttl);
        buf.put_u16(self.rdata.len() as u16);
        buf.put_slice(&self.rdata);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_question(question: &Question) -> Vec<u8> {
        let mut buf = BytesMut::new();
        question.encode(&mut buf).unwrap();
        buf.to_vec()
    }

    fn encode_record(record: &ResourceRecord) -> Vec<u8> {
        let mut buf = BytesMut::new();
        record.encode(&mut buf).unwrap();
        buf.to_vec()
    }

    #[test]
    fn test_question_roundtrip() {
        let question = Question {
            name: DomainName::from("example.com"),
            qtype: TYPE_A,
            qclass: CLASS_IN,
        };

        let bytes = encode_question(&question);
        assert_eq!(bytes.len(), question.encoded_len());

        let mut cache = LabelCache::new();
        let (parsed, cursor) = Question::decode(&bytes, 0, &mut cache).unwrap();
        assert_eq!(parsed, question);
        assert_eq!(cursor, bytes.len());
    }

    #[test]
    fn test_question_truncated_fields() {
        let name = DomainName::from("example.com").encode().unwrap();
        let mut bytes = name.clone();
        bytes.extend_from_slice(&[0, 1]); // type only, class missing

        let mut cache = LabelCache::new();
        let result = Question::decode(&bytes, 0, &mut cache);
        assert!(matches!(result, Err(DnsError::TruncatedFrame)));
    }

    #[test]
    fn test_a_record_construction() {
        let record = ResourceRecord::a_record(
            DomainName::from("example.com"),
            60,
            Ipv4Addr::new(8, 8, 8, 8),
        );

        assert_eq!(record.rtype, TYPE_A);
        assert_eq!(record.rclass, CLASS_IN);
        assert_eq!(record.ttl, 60);
        assert_eq!(record.rdata, vec![8, 8, 8, 8]);
    }

    #[test]
    fn test_record_roundtrip() {
        let record = ResourceRecord::a_record(
            DomainName::from("example.com"),
            300,
            Ipv4Addr::new(192, 168, 1, 1),
        );

        let bytes = encode_record(&record);
        assert_eq!(bytes.len(), record.encoded_len());

        let mut cache = LabelCache::new();
        let (parsed, cursor) = ResourceRecord::decode(&bytes, 0, &mut cache).unwrap();
        assert_eq!(parsed, record);
        assert_eq!(cursor, bytes.len());
    }

    #[test]
    fn test_record_rdata_past_frame_end() {
        let record = ResourceRecord::a_record(
            DomainName::from("example.com"),
            60,
            Ipv4Addr::new(1, 2, 3, 4),
        );

        let bytes = encode_record(&record);
        let truncated = &bytes[..bytes.len() - 2];

        let mut cache = LabelCache::new();
        let result = ResourceRecord::decode(truncated, 0, &mut cache);
        assert!(matches!(result, Err(DnsError::TruncatedFrame)));
    }

    #[test]
    fn test_opaque_rdata_is_preserved() {
        let record = ResourceRecord {
            name: DomainName::from("example.com"),
            rtype: 16, // TXT, relayed without interpretation
            rclass: CLASS_IN,
            ttl: 120,
            rdata: b"\x0bhello world".to_vec(),
        };

        let bytes = encode_record(&record);
        let mut cache = LabelCache::new();
        let (parsed, _) = ResourceRecord::decode(&bytes, 0, &mut cache).unwrap();
        assert_eq!(parsed.rdata, record.rdata);
    }
}
