use bytes::{BufMut, BytesMut};

use crate::dns_header::{DnsHeader, OPCODE_QUERY, RCODE_NOT_IMPLEMENTED};
use crate::dns_label::LabelCache;
use crate::dns_record::{Question, ResourceRecord, CLASS_IN, TYPE_A};
use crate::error::DnsError;

/// A DNS message: header plus question and answer sections.
///
/// Authority and additional sections are neither decoded nor produced;
/// responses built here always leave their counts at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsMessage {
    pub header: DnsHeader,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
}

impl DnsMessage {
    /// Decode a whole frame: header, then exactly QDCOUNT questions, then
    /// exactly ANCOUNT answer records, through a single shared cursor.
    ///
    /// Later names may point back at labels introduced by earlier entries,
    /// so one label cache spans the whole frame and is dropped with it.
    pub fn decode(frame: &[u8]) -> Result<Self, DnsError> {
        let header = DnsHeader::from_bytes(frame)?;
        let mut cache = LabelCache::new();
        let mut cursor = 12;

        let mut questions = Vec::new();
        for _ in 0..header.qdcount() {
            let (question, next) = Question::decode(frame, cursor, &mut cache)?;
            questions.push(question);
            cursor = next;
        }

        let mut answers = Vec::new();
        for _ in 0..header.ancount() {
            let (answer, next) = ResourceRecord::decode(frame, cursor, &mut cache)?;
            answers.push(answer);
            cursor = next;
        }

        Ok(Self {
            header,
            questions,
            answers,
        })
    }

    /// Build the response shell for `request`: id, opcode, and RD carried
    /// over, QR set, RCODE 0 for standard queries and "not implemented"
    /// for anything else, and the request's questions copied with the
    /// type forced to A and the class to IN.
    ///
    /// Starting from a zeroed header is what forces AA, TC, RA, and Z to
    /// zero; the bit mutators only ever raise bits. The answer section
    /// starts empty and is filled by the forwarder or the static
    /// generator.
    pub fn response_skeleton(request: &Self) -> Self {
        let mut header = DnsHeader::new();
        header.set_id(request.header.id());
        header.set_qr();
        header.set_opcode(request.header.opcode());
        if request.header.rd() {
            header.set_rd();
        }
        if request.header.opcode() != OPCODE_QUERY {
            header.set_rcode(RCODE_NOT_IMPLEMENTED);
        }

        let questions: Vec<Question> = request
            .questions
            .iter()
            .map(|question| Question {
                name: question.name.clone(),
                qtype: TYPE_A,
                qclass: CLASS_IN,
            })
            .collect();
        header.set_qdcount(questions.len() as u16);

        Self {
            header,
            questions,
            answers: Vec::new(),
        }
    }

    /// Serialize header, questions, and answers in order. The buffer is
    /// sized up front from the entries' exact encoded lengths.
    pub fn serialize(&self) -> Result<Vec<u8>, DnsError> {
        let total = 12
            + self
                .questions
                .iter()
                .map(Question::encoded_len)
                .sum::<usize>()
            + self
                .answers
                .iter()
                .map(ResourceRecord::encoded_len)
                .sum::<usize>();

        let mut buf = BytesMut::with_capacity(total);
        buf.put_slice(&self.header.to_bytes());
        for question in &self.questions {
            question.encode(&mut buf)?;
        }
        for answer in &self.answers {
            answer.encode(&mut buf)?;
        }

        Ok(buf.into())
    }
}
