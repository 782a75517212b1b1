use crate::areas::repository::Repository;
use crate::objects::object::{Object, ObjectBox};
use crate::objects::object_type::ObjectType;
use std::io::Write;

impl Repository {
    /// Print the payload of an object. Blobs are emitted byte-for-byte;
    /// trees print one line per entry; commits and tags print their
    /// header-and-message body.
    pub fn cat_file(&self, object: &str, expected: Option<ObjectType>) -> anyhow::Result<()> {
        let oid = self.resolve_object(object, expected)?;
        let parsed = self.database().parse_object(&oid)?;

        match parsed {
            ObjectBox::Blob(blob) => self.writer().write_all(blob.content())?,
            ObjectBox::Tree(tree) => writeln!(self.writer(), "{}", tree.display())?,
            other => write!(self.writer(), "{}", other.display())?,
        }

        Ok(())
    }
}
