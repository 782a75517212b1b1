use crate::areas::repository::Repository;
use crate::objects::commit::Author;
use crate::objects::object::Object;
use crate::objects::tag::Tag;
use std::io::Write;

impl Repository {
    /// With no name, list existing tags. With a name, tag `target`:
    /// lightweight by default, or through a stored tag object when
    /// `annotate` is set.
    pub fn tag(
        &self,
        name: Option<&str>,
        target: &str,
        annotate: bool,
        message: Option<&str>,
    ) -> anyhow::Result<()> {
        let Some(name) = name else {
            return self.list_tags();
        };

        let target_oid = self.resolve_revision(target)?;

        if annotate {
            let tagger = Author::load_from_env()?;
            let target_type = self.database().get_object_type(&target_oid)?;

            let tag = Tag::new(
                &target_oid,
                target_type,
                name,
                &tagger,
                message.unwrap_or(name),
            );
            let tag_oid = tag.object_id()?;

            self.database().store(tag)?;
            self.refs().create_tag_ref(name, &tag_oid)?;
        } else {
            self.refs().create_tag_ref(name, &target_oid)?;
        }

        Ok(())
    }

    fn list_tags(&self) -> anyhow::Result<()> {
        for (name, _) in self.refs().list_refs()? {
            if let Some(tag_name) = name.strip_prefix("refs/tags/") {
                writeln!(self.writer(), "{tag_name}")?;
            }
        }

        Ok(())
    }
}
