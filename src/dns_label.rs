use std::collections::HashMap;
use std::fmt;

use crate::error::DnsError;

/// Longest single label the wire format allows.
pub const MAX_LABEL_LEN: usize = 63;
/// Longest encoded name, terminator byte included.
pub const MAX_NAME_LEN: usize = 255;

/// Both high bits set marks the first byte of a compression pointer.
const POINTER_MASK: u8 = 0b1100_0000;

/// Offsets of every literal label seen while decoding one frame.
///
/// A compression pointer references the byte offset of a label that
/// appeared earlier in the same frame, so the mapping is only meaningful
/// for the single decode pass that built it and must never be reused
/// across frames.
#[derive(Debug, Default)]
pub struct LabelCache {
    by_offset: HashMap<usize, String>,
    by_label: HashMap<String, usize>,
}

impl LabelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a literal label at the offset of its length byte. The first
    /// occurrence of a repeated label keeps its offset.
    fn record(&mut self, offset: usize, label: &str) {
        self.by_offset.insert(offset, label.to_string());
        self.by_label.entry(label.to_string()).or_insert(offset);
    }

    /// The label whose length byte sits at `offset`, if one was decoded.
    pub fn label_at(&self, offset: usize) -> Option<&str> {
        self.by_offset.get(&offset).map(String::as_str)
    }

    /// The offset where `label` first appeared in the frame.
    pub fn offset_of(&self, label: &str) -> Option<usize> {
        self.by_label.get(label).copied()
    }
}

/// A domain name as an ordered sequence of labels; empty means the root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DomainName {
    labels: Vec<String>,
}

impl DomainName {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_labels(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Exact size of the encoded form: one length byte per label, the
    /// label bytes themselves, and the zero terminator.
    pub fn encoded_len(&self) -> usize {
        self.labels.iter().map(|label| 1 + label.len()).sum::<usize>() + 1
    }

    /// Encode as length-prefixed labels with a zero terminator.
    ///
    /// Compression pointers are never emitted; responses stay small
    /// enough over UDP that the extra bytes do not matter.
    pub fn encode(&self) -> Result<Vec<u8>, DnsError> {
        let mut encoded = Vec::with_capacity(self.encoded_len());

        for label in &self.labels {
            if label.len() > MAX_LABEL_LEN {
                return Err(DnsError::LabelTooLong(label.clone()));
            }
            encoded.push(label.len() as u8);
            encoded.extend_from_slice(label.as_bytes());
        }
        encoded.push(0);

        if encoded.len() > MAX_NAME_LEN {
            return Err(DnsError::NameTooLong(encoded.len()));
        }

        Ok(encoded)
    }

    /// Decode a label sequence starting at `cursor`, resolving compression
    /// pointers through `cache`. Returns the name and the cursor position
    /// just past the sequence.
    ///
    /// Labels are read until a zero byte ends the sequence or a pointer
    /// redirects it. A pointer is resolved entirely from the cache: the
    /// label recorded at the target offset plus every label that followed
    /// it in the original stream, found by stepping `offset + 1 + len`
    /// until no further label is mapped. Since only literal labels are
    /// recorded, a pointer can only reach offsets strictly earlier in the
    /// frame and the walk only moves forward, so decoding always
    /// terminates.
    pub fn decode(
        frame: &[u8],
        cursor: usize,
        cache: &mut LabelCache,
    ) -> Result<(Self, usize), DnsError> {
        let mut labels = Vec::new();
        let mut pos = cursor;

        loop {
            let length = *frame.get(pos).ok_or(DnsError::TruncatedFrame)?;

            if length == 0 {
                pos += 1;
                break;
            }

            if length & POINTER_MASK == POINTER_MASK {
                let low = *frame.get(pos + 1).ok_or(DnsError::TruncatedFrame)?;
                let target = ((length & !POINTER_MASK) as usize) << 8 | low as usize;
                resolve_pointer(cache, target, &mut labels)?;
                pos += 2;
                // a pointer always ends the sequence
                break;
            }

            let end = pos + 1 + length as usize;
            let raw = frame.get(pos + 1..end).ok_or(DnsError::TruncatedFrame)?;
            let label = std::str::from_utf8(raw).map_err(|_| DnsError::InvalidLabel)?;

            cache.record(pos, label);
            labels.push(label.to_string());
            pos = end;
        }

        Ok((Self { labels }, pos))
    }
}

/// Yield the label recorded at `target` plus every label that followed it
/// in the original byte stream.
fn resolve_pointer(
    cache: &LabelCache,
    target: usize,
    labels: &mut Vec<String>,
) -> Result<(), DnsError> {
    let first = cache
        .label_at(target)
        .ok_or(DnsError::InvalidLabelReference(target))?;
    labels.push(first.to_string());

    let mut offset = target + 1 + first.len();
    while let Some(label) = cache.label_at(offset) {
        labels.push(label.to_string());
        offset += 1 + label.len();
    }

    Ok(())
}

impl From<&str> for DomainName {
    fn from(name: &str) -> Self {
        let labels = name
            .split('.')
            .filter(|label| !label.is_empty())
            .map(str::to_string)
            .collect();
        Self { labels }
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.labels.is_empty() {
            return f.write_str(".");
        }
        f.write_str(&self.labels.join("."))
    }
}
