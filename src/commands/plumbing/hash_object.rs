use crate::areas::repository::Repository;
use crate::objects::blob::Blob;
use crate::objects::commit::Commit;
use crate::objects::object::{Object, Unpackable};
use crate::objects::object_id::ObjectId;
use crate::objects::object_type::ObjectType;
use crate::objects::tag::Tag;
use crate::objects::tree::Tree;
use anyhow::Context;
use bytes::Bytes;
use std::io::Write;
use std::path::Path;

impl Repository {
    /// Hash a file as an object of the given type and print the id,
    /// storing the object when `write` is set.
    ///
    /// Non-blob types parse the file through the matching codec first, so
    /// a malformed tree or commit is rejected instead of stored.
    pub fn hash_object(
        &self,
        object_path: &Path,
        object_type: ObjectType,
        write: bool,
    ) -> anyhow::Result<()> {
        let data = std::fs::read(object_path)
            .context(format!("Unable to read {}", object_path.display()))?;
        let reader = std::io::Cursor::new(&data);

        let oid = match object_type {
            ObjectType::Blob => self.hash_one(Blob::new(Bytes::from(data.clone())), write)?,
            ObjectType::Tree => self.hash_one(Tree::deserialize(reader)?, write)?,
            ObjectType::Commit => self.hash_one(Commit::deserialize(reader)?, write)?,
            ObjectType::Tag => self.hash_one(Tag::deserialize(reader)?, write)?,
        };

        writeln!(self.writer(), "{oid}")?;

        Ok(())
    }

    fn hash_one(&self, object: impl Object, write: bool) -> anyhow::Result<ObjectId> {
        let oid = object.object_id()?;
        if write {
            self.database().store(object)?;
        }

        Ok(oid)
    }
}
