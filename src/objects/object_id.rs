use std::io;
use std::path::PathBuf;

/// A 40-character hexadecimal SHA-1 digest naming one stored object.
///
/// Two payloads with the same type and bytes always hash to the same id,
/// which is what makes the object store deduplicating and integrity-checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn try_parse(id: String) -> anyhow::Result<Self> {
        if id.len() != 40 {
            return Err(anyhow::anyhow!("Invalid object ID length: {}", id.len()));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(anyhow::anyhow!("Invalid object ID characters: {id}"));
        }
        Ok(Self(id))
    }

    /// Relative path of the loose object file: the first two hex characters
    /// shard the directory, the remaining 38 name the file.
    pub fn to_path(&self) -> PathBuf {
        PathBuf::from(format!("{}/{}", &self.0[..2], &self.0[2..]))
    }

    pub fn short(&self) -> &str {
        &self.0[..7]
    }

    /// Write the digest as 20 raw bytes.
    pub fn write_h40_to<W: io::Write>(&self, writer: &mut W) -> anyhow::Result<()> {
        for i in (0..40).step_by(2) {
            let byte = u8::from_str_radix(&self.0[i..i + 2], 16)
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "Invalid hex digit"))?;
            writer.write_all(&[byte])?;
        }

        Ok(())
    }

    /// Read 20 raw bytes and render them back as the 40-hex digest.
    pub fn read_h40_from<R: io::Read + ?Sized>(reader: &mut R) -> anyhow::Result<Self> {
        let mut raw = [0u8; 20];
        reader.read_exact(&mut raw)?;

        let mut hex40 = String::with_capacity(40);
        for byte in raw {
            hex40.push_str(&format!("{byte:02x}"));
        }

        Self::try_parse(hex40)
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
