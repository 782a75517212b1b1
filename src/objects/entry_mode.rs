use crate::errors::KitError;
use crate::objects::object_type::ObjectType;

#[derive(Debug, Clone, Eq, Ord, Default, PartialEq, PartialOrd)]
pub enum FileMode {
    #[default]
    Regular,
    Executable,
}

/// Normalized tree-entry mode: the object kind plus its permission class.
///
/// On-disk mode strings come in five- and six-digit forms; they are
/// normalized here once at the parse boundary and re-rendered to the padded
/// six-character form only when serializing.
#[derive(Debug, Clone, Eq, Ord, Default, PartialEq, PartialOrd)]
pub enum EntryMode {
    File(FileMode),
    Symlink,
    #[default]
    Directory,
    Submodule,
}

impl EntryMode {
    /// Six-character on-disk form, left-zero-padded.
    pub fn as_tree_str(&self) -> &str {
        match self {
            EntryMode::File(FileMode::Regular) => "100644",
            EntryMode::File(FileMode::Executable) => "100755",
            EntryMode::Symlink => "120000",
            EntryMode::Directory => "040000",
            EntryMode::Submodule => "160000",
        }
    }

    /// Numeric form persisted in index entries: a 4-bit type code shifted
    /// over 12 permission bits.
    pub fn as_u32(&self) -> u32 {
        match self {
            EntryMode::File(FileMode::Regular) => 0o100644,
            EntryMode::File(FileMode::Executable) => 0o100755,
            EntryMode::Symlink => 0o120000,
            EntryMode::Directory => 0o040000,
            EntryMode::Submodule => 0o160000,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, EntryMode::Directory)
    }

    /// The kind of object a tree entry with this mode points at.
    pub fn object_type(&self) -> ObjectType {
        match self {
            EntryMode::File(_) | EntryMode::Symlink => ObjectType::Blob,
            EntryMode::Directory => ObjectType::Tree,
            EntryMode::Submodule => ObjectType::Commit,
        }
    }

    /// Parse an ASCII mode read from a tree object, accepting the five-digit
    /// form by left-zero-padding it to six.
    pub fn from_tree_str(mode: &str) -> anyhow::Result<Self> {
        let normalized = match mode.len() {
            5 => format!("0{mode}"),
            6 => mode.to_string(),
            _ => return Err(KitError::InvalidTreeMode(mode.to_string()).into()),
        };

        match normalized.as_str() {
            "100644" => Ok(EntryMode::File(FileMode::Regular)),
            "100755" => Ok(EntryMode::File(FileMode::Executable)),
            "120000" => Ok(EntryMode::Symlink),
            "040000" => Ok(EntryMode::Directory),
            "160000" => Ok(EntryMode::Submodule),
            _ => Err(KitError::InvalidTreeMode(mode.to_string()).into()),
        }
    }

    pub fn from_index_u32(mode: u32) -> anyhow::Result<Self> {
        match mode {
            0o100644 => Ok(EntryMode::File(FileMode::Regular)),
            0o100755 => Ok(EntryMode::File(FileMode::Executable)),
            0o120000 => Ok(EntryMode::Symlink),
            0o160000 => Ok(EntryMode::Submodule),
            _ => Err(KitError::InvalidTreeMode(format!("{mode:o}")).into()),
        }
    }
}
