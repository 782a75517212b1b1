//! Annotated tag object: a commit-shaped KVLM body with a distinguished
//! type label, naming a single target object.

use crate::objects::commit::Author;
use crate::objects::kvlm::Kvlm;
use crate::objects::object::Unpackable;
use crate::objects::object::{Object, Packable};
use crate::objects::object_id::ObjectId;
use crate::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use std::io::{BufRead, Read, Write};

#[derive(Debug, Clone)]
pub struct Tag {
    kvlm: Kvlm,
}

impl Tag {
    pub fn new(
        target: &ObjectId,
        target_type: ObjectType,
        name: &str,
        tagger: &Author,
        message: &str,
    ) -> Self {
        let mut kvlm = Kvlm::new();
        kvlm.push(&b"object"[..], target.as_ref().as_bytes().to_vec());
        kvlm.push(&b"type"[..], target_type.as_str().as_bytes().to_vec());
        kvlm.push(&b"tag"[..], name.as_bytes().to_vec());
        kvlm.push(&b"tagger"[..], tagger.display().into_bytes());

        let mut message = message.to_owned();
        if !message.ends_with('\n') {
            message.push('\n');
        }
        kvlm.set_message(message.into_bytes());

        Tag { kvlm }
    }

    pub fn kvlm(&self) -> &Kvlm {
        &self.kvlm
    }

    /// The object this tag points at. Required header.
    pub fn target_oid(&self) -> anyhow::Result<ObjectId> {
        let target = self
            .kvlm
            .get_scalar(b"object")
            .context("Tag has no object header")?;

        ObjectId::try_parse(String::from_utf8(target.to_vec())?)
    }
}

impl Packable for Tag {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let body = self.kvlm.serialize();

        let mut tag_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), body.len());
        tag_bytes.write_all(header.as_bytes())?;
        tag_bytes.write_all(&body)?;

        Ok(Bytes::from(tag_bytes))
    }
}

impl Unpackable for Tag {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut body = Vec::new();
        reader.read_to_end(&mut body)?;

        Ok(Tag {
            kvlm: Kvlm::parse(&body)?,
        })
    }
}

impl Object for Tag {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tag
    }

    fn display(&self) -> String {
        String::from_utf8_lossy(&self.kvlm.serialize()).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn tag_round_trips_and_names_its_target() {
        let target =
            ObjectId::try_parse("29ff16c9c14e2652b22f8b78bb08a5a07930c147".into()).unwrap();
        let tagger = Author::new_with_timestamp(
            "Ada".into(),
            "ada@example.com".into(),
            chrono::DateTime::parse_from_rfc2822("Tue, 22 May 2018 22:17:03 +0200").unwrap(),
        );
        let tag = Tag::new(&target, ObjectType::Commit, "v0.1.0", &tagger, "first release");

        let serialized = tag.serialize().unwrap();
        let mut reader = std::io::Cursor::new(serialized);
        let (object_type, _) = ObjectType::parse_header(&mut reader).unwrap();
        assert_eq!(object_type, ObjectType::Tag);

        let parsed = Tag::deserialize(reader).unwrap();
        assert_eq!(parsed.target_oid().unwrap(), target);
        assert_eq!(
            parsed.kvlm().get_scalar(b"tag").unwrap().as_ref(),
            b"v0.1.0"
        );
    }
}
