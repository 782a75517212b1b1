//! Key-value-list-with-message codec
//!
//! Commit and tag bodies share this encoding: a run of `key SP value`
//! header lines, a single blank line, then the raw message bytes. Values
//! may span lines; every line after the first starts with one continuation
//! space that is stripped on parse and re-inserted on serialize. A key that
//! repeats accumulates its values in encounter order.

use bytes::Bytes;

/// Ordered header multimap plus the trailing message.
///
/// Header keys keep insertion order, so `serialize(parse(x)) == x` holds at
/// the byte level for well-formed input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Kvlm {
    headers: Vec<(Bytes, Vec<Bytes>)>,
    message: Bytes,
}

impl Kvlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &[u8]) -> Option<&[Bytes]> {
        self.headers
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, values)| values.as_slice())
    }

    pub fn get_scalar(&self, key: &[u8]) -> Option<&Bytes> {
        self.get(key).and_then(|values| values.first())
    }

    /// Append a value under `key`, keeping the key's first-seen position.
    pub fn push(&mut self, key: impl Into<Bytes>, value: impl Into<Bytes>) {
        let key = key.into();
        match self.headers.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value.into()),
            None => self.headers.push((key, vec![value.into()])),
        }
    }

    pub fn set_message(&mut self, message: impl Into<Bytes>) {
        self.message = message.into();
    }

    pub fn message(&self) -> &Bytes {
        &self.message
    }

    pub fn headers(&self) -> impl Iterator<Item = (&Bytes, &[Bytes])> {
        self.headers.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Parse a raw commit/tag body.
    ///
    /// Runs as a single loop over the input; the accumulator is constructed
    /// here, fresh for every call.
    pub fn parse(raw: &[u8]) -> anyhow::Result<Kvlm> {
        let mut kvlm = Kvlm::new();
        let mut pos = 0;

        loop {
            let space = find_byte(raw, pos, b' ');
            let newline = find_byte(raw, pos, b'\n');

            // A newline before the next space (or no space left) means the
            // headers are done and the rest is the message.
            let at_message = match (space, newline) {
                (None, _) => true,
                (Some(space), Some(newline)) => newline < space,
                (Some(_), None) => false,
            };

            if at_message {
                if newline != Some(pos) {
                    return Err(anyhow::anyhow!(
                        "malformed body: expected blank line before message at offset {pos}"
                    ));
                }
                kvlm.set_message(Bytes::copy_from_slice(&raw[pos + 1..]));
                return Ok(kvlm);
            }

            let space = space.expect("checked above");
            let key = Bytes::copy_from_slice(&raw[pos..space]);

            // The value runs until a newline not followed by a continuation
            // space.
            let mut end = space;
            loop {
                end = find_byte(raw, end + 1, b'\n')
                    .ok_or_else(|| anyhow::anyhow!("malformed header: unterminated value"))?;
                if raw.get(end + 1) != Some(&b' ') {
                    break;
                }
            }

            kvlm.push(key, unfold_value(&raw[space + 1..end]));
            pos = end + 1;
        }
    }

    /// Serialize back to the raw byte encoding: headers in mapping order,
    /// one blank line, then the message verbatim.
    pub fn serialize(&self) -> Bytes {
        let mut out = Vec::new();

        for (key, values) in &self.headers {
            for value in values {
                out.extend_from_slice(key);
                out.push(b' ');
                for &byte in value.iter() {
                    out.push(byte);
                    if byte == b'\n' {
                        out.push(b' ');
                    }
                }
                out.push(b'\n');
            }
        }

        out.push(b'\n');
        out.extend_from_slice(&self.message);

        Bytes::from(out)
    }
}

fn find_byte(haystack: &[u8], from: usize, needle: u8) -> Option<usize> {
    haystack
        .get(from..)?
        .iter()
        .position(|&b| b == needle)
        .map(|i| from + i)
}

/// Strip the one leading space from each continuation line.
fn unfold_value(folded: &[u8]) -> Bytes {
    let mut value = Vec::with_capacity(folded.len());
    let mut i = 0;

    while i < folded.len() {
        value.push(folded[i]);
        if folded[i] == b'\n' && folded.get(i + 1) == Some(&b' ') {
            i += 1;
        }
        i += 1;
    }

    Bytes::from(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn commit_body() -> Vec<u8> {
        b"tree 29ff16c9c14e2652b22f8b78bb08a5a07930c147\n\
          parent 206941306e8a8af65b66eaaaea388a7ae24d49a0\n\
          author Thibault Polge <thibault@thb.lt> 1527025023 +0200\n\
          committer Thibault Polge <thibault@thb.lt> 1527025044 +0200\n\
          gpgsig -----BEGIN PGP SIGNATURE-----\n \n iQIzBAABCAAdFiEE\n -----END PGP SIGNATURE-----\n\
          \n\
          Create first draft\n"
            .to_vec()
    }

    #[rstest]
    fn parses_headers_and_message(commit_body: Vec<u8>) {
        let kvlm = Kvlm::parse(&commit_body).unwrap();

        assert_eq!(
            kvlm.get_scalar(b"tree").unwrap().as_ref(),
            b"29ff16c9c14e2652b22f8b78bb08a5a07930c147"
        );
        assert_eq!(
            kvlm.get_scalar(b"gpgsig").unwrap().as_ref(),
            b"-----BEGIN PGP SIGNATURE-----\n\niQIzBAABCAAdFiEE\n-----END PGP SIGNATURE-----"
        );
        assert_eq!(kvlm.message().as_ref(), b"Create first draft\n");
    }

    #[rstest]
    fn round_trips_byte_identical(commit_body: Vec<u8>) {
        let kvlm = Kvlm::parse(&commit_body).unwrap();
        assert_eq!(kvlm.serialize().as_ref(), commit_body.as_slice());
    }

    #[rstest]
    fn repeated_keys_accumulate_in_encounter_order() {
        let raw = b"tree 29ff16c9c14e2652b22f8b78bb08a5a07930c147\n\
                    parent aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\n\
                    parent bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb\n\
                    \nmerge\n";
        let kvlm = Kvlm::parse(raw).unwrap();

        let parents = kvlm.get(b"parent").unwrap();
        assert_eq!(parents.len(), 2);
        assert_eq!(parents[0].as_ref(), b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        assert_eq!(parents[1].as_ref(), b"bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");

        assert_eq!(kvlm.serialize().as_ref(), raw.as_slice());
    }

    #[rstest]
    fn successive_parses_do_not_share_state(commit_body: Vec<u8>) {
        let first = Kvlm::parse(&commit_body).unwrap();
        let second = Kvlm::parse(&commit_body).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.get(b"parent").unwrap().len(), 1);
    }

    #[rstest]
    fn message_only_body() {
        let raw = b"\njust a message\n";
        let kvlm = Kvlm::parse(raw).unwrap();

        assert_eq!(kvlm.headers().count(), 0);
        assert_eq!(kvlm.message().as_ref(), b"just a message\n");
        assert_eq!(kvlm.serialize().as_ref(), raw.as_slice());
    }

    #[rstest]
    fn many_continuation_lines_do_not_recurse() {
        let mut raw = b"note first".to_vec();
        for _ in 0..10_000 {
            raw.extend_from_slice(b"\n more");
        }
        raw.extend_from_slice(b"\n\ndeep\n");

        let kvlm = Kvlm::parse(&raw).unwrap();
        assert_eq!(kvlm.serialize().as_ref(), raw.as_slice());
    }
}
