use crate::areas::repository::Repository;
use crate::objects::object_type::ObjectType;
use std::io::Write;

impl Repository {
    /// Resolve a revision name (HEAD, hex prefix, tag or branch) to one
    /// full object id, optionally peeling to a wanted type.
    pub fn rev_parse(&self, name: &str, object_type: Option<ObjectType>) -> anyhow::Result<()> {
        let oid = self.resolve_object(name, object_type)?;
        writeln!(self.writer(), "{oid}")?;

        Ok(())
    }
}
