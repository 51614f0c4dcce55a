use std::net::Ipv4Addr;

use crate::dns_message::DnsMessage;
use crate::dns_record::ResourceRecord;

/// Address handed out for every question when no upstream is configured.
pub const PLACEHOLDER_ADDR: Ipv4Addr = Ipv4Addr::new(8, 8, 8, 8);
/// TTL of placeholder answers, in seconds.
pub const PLACEHOLDER_TTL: u32 = 60;

/// Append one placeholder A record per question and update ANCOUNT to
/// match. A stand-in for authoritative resolution, not a zone store.
pub fn add_static_answers(message: &mut DnsMessage) {
    for question in &message.questions {
        message.answers.push(ResourceRecord::a_record(
            question.name.clone(),
            PLACEHOLDER_TTL,
            PLACEHOLDER_ADDR,
        ));
    }
    message.header.set_ancount(message.answers.len() as u16);
}
