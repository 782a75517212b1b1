//! Blob object: stored file content, opaque bytes.
//!
//! On disk: `blob <size>\0<content>`. The name and permissions of the file
//! live in the trees that point at the blob, never in the blob itself.

use crate::objects::object::Unpackable;
use crate::objects::object::{Object, Packable};
use crate::objects::object_type::ObjectType;
use bytes::Bytes;
use derive_new::new;
use std::io::{BufRead, Read, Write};

#[derive(Debug, Clone, new)]
pub struct Blob {
    content: Bytes,
}

impl Blob {
    pub fn content(&self) -> &Bytes {
        &self.content
    }
}

impl Packable for Blob {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut blob_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), self.content.len());
        blob_bytes.write_all(header.as_bytes())?;
        blob_bytes.write_all(&self.content)?;

        Ok(Bytes::from(blob_bytes))
    }
}

impl Unpackable for Blob {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        // the header has already been read
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;

        Ok(Self::new(Bytes::from(content)))
    }
}

impl Object for Blob {
    fn object_type(&self) -> ObjectType {
        ObjectType::Blob
    }

    fn display(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn serializes_with_typed_header() {
        let blob = Blob::new(Bytes::from_static(b"hi\n"));
        let serialized = blob.serialize().unwrap();

        assert_eq!(serialized.as_ref(), b"blob 3\0hi\n");
    }

    #[rstest]
    fn identical_content_hashes_identically() {
        let first = Blob::new(Bytes::from_static(b"same bytes"));
        let second = Blob::new(Bytes::from_static(b"same bytes"));

        assert_eq!(
            first.object_id().unwrap(),
            second.object_id().unwrap()
        );
    }
}
