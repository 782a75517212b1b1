//! Commit object: a KVLM body naming a tree snapshot, zero or more parent
//! commits, authorship and a message.
//!
//! On disk:
//!
//! ```text
//! commit <size>\0tree <tree-sha>
//! parent <parent-sha>
//! author <name> <email> <epoch-seconds> <tz-offset>
//! committer <name> <email> <epoch-seconds> <tz-offset>
//!
//! <commit message>
//! ```

use crate::objects::kvlm::Kvlm;
use crate::objects::object::Unpackable;
use crate::objects::object::{Object, Packable};
use crate::objects::object_id::ObjectId;
use crate::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use std::io::{BufRead, Read, Write};

/// Author or committer identity with a timestamp.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Author {
    name: String,
    email: String,
    timestamp: chrono::DateTime<chrono::FixedOffset>,
}

impl Author {
    pub fn new(name: String, email: String) -> Self {
        Author {
            name,
            email,
            timestamp: chrono::Local::now().fixed_offset(),
        }
    }

    pub fn new_with_timestamp(
        name: String,
        email: String,
        timestamp: chrono::DateTime<chrono::FixedOffset>,
    ) -> Self {
        Author {
            name,
            email,
            timestamp,
        }
    }

    /// `Name <email> epoch-seconds timezone-offset`, the header value format.
    pub fn display(&self) -> String {
        format!(
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }

    /// Load the author identity from `KIT_AUTHOR_NAME` / `KIT_AUTHOR_EMAIL`,
    /// with an optional fixed timestamp in `KIT_AUTHOR_DATE`.
    pub fn load_from_env() -> anyhow::Result<Self> {
        let name = std::env::var("KIT_AUTHOR_NAME").context("KIT_AUTHOR_NAME not set")?;
        let email = std::env::var("KIT_AUTHOR_EMAIL").context("KIT_AUTHOR_EMAIL not set")?;
        let timestamp = std::env::var("KIT_AUTHOR_DATE").ok().and_then(|date_str| {
            chrono::DateTime::parse_from_rfc2822(&date_str)
                .or_else(|_| chrono::DateTime::parse_from_str(&date_str, "%Y-%m-%d %H:%M:%S %z"))
                .ok()
        });

        match timestamp {
            Some(ts) => Ok(Author::new_with_timestamp(name, email, ts)),
            None => Ok(Author::new(name, email)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Commit {
    kvlm: Kvlm,
}

impl Commit {
    pub fn new(
        tree_oid: &ObjectId,
        parents: &[ObjectId],
        author: &Author,
        message: &str,
    ) -> Self {
        let mut kvlm = Kvlm::new();
        kvlm.push(&b"tree"[..], tree_oid.as_ref().as_bytes().to_vec());
        for parent in parents {
            kvlm.push(&b"parent"[..], parent.as_ref().as_bytes().to_vec());
        }
        kvlm.push(&b"author"[..], author.display().into_bytes());
        kvlm.push(&b"committer"[..], author.display().into_bytes());

        let mut message = message.to_owned();
        if !message.ends_with('\n') {
            message.push('\n');
        }
        kvlm.set_message(message.into_bytes());

        Commit { kvlm }
    }

    pub fn kvlm(&self) -> &Kvlm {
        &self.kvlm
    }

    /// The snapshot this commit records. Required header.
    pub fn tree_oid(&self) -> anyhow::Result<ObjectId> {
        let tree = self
            .kvlm
            .get_scalar(b"tree")
            .context("Commit has no tree header")?;

        ObjectId::try_parse(String::from_utf8(tree.to_vec())?)
    }

    /// Parent edges in header order; empty for a root commit.
    pub fn parent_oids(&self) -> anyhow::Result<Vec<ObjectId>> {
        self.kvlm
            .get(b"parent")
            .unwrap_or(&[])
            .iter()
            .map(|parent| ObjectId::try_parse(String::from_utf8(parent.to_vec())?))
            .collect()
    }

    pub fn author_line(&self) -> Option<String> {
        self.kvlm
            .get_scalar(b"author")
            .map(|line| String::from_utf8_lossy(line).into_owned())
    }

    pub fn message(&self) -> &Bytes {
        self.kvlm.message()
    }

    pub fn short_message(&self) -> String {
        String::from_utf8_lossy(self.kvlm.message())
            .lines()
            .next()
            .unwrap_or("")
            .to_string()
    }
}

impl Packable for Commit {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let body = self.kvlm.serialize();

        let mut commit_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), body.len());
        commit_bytes.write_all(header.as_bytes())?;
        commit_bytes.write_all(&body)?;

        Ok(Bytes::from(commit_bytes))
    }
}

impl Unpackable for Commit {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut body = Vec::new();
        reader.read_to_end(&mut body)?;

        Ok(Commit {
            kvlm: Kvlm::parse(&body)?,
        })
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn display(&self) -> String {
        String::from_utf8_lossy(&self.kvlm.serialize()).into_owned()
    }
}
