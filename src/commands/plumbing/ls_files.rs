use crate::areas::repository::Repository;
use std::io::Write;

impl Repository {
    /// Print the staged paths in index order. `verbose` adds the mode,
    /// blob id and stage of each entry.
    pub fn ls_files(&self, verbose: bool) -> anyhow::Result<()> {
        let mut index = self.index();
        index.rehydrate()?;

        for entry in index.entries() {
            if verbose {
                writeln!(
                    self.writer(),
                    "{} {} {}\t{}",
                    entry.metadata.mode.as_tree_str(),
                    entry.oid,
                    u16::from(entry.metadata.stage),
                    entry.name.display()
                )?;
            } else {
                writeln!(self.writer(), "{}", entry.name.display())?;
            }
        }

        Ok(())
    }
}
