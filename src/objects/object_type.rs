use std::io::BufRead;

/// The four kinds of stored objects.
///
/// A tag shares the commit body codec; only the type label differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectType {
    pub fn as_str(&self) -> &str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
            ObjectType::Commit => "commit",
            ObjectType::Tag => "tag",
        }
    }

    /// Parse the `type SP length NUL` header off the front of a decompressed
    /// object, returning the type and the declared payload length.
    pub fn parse_header(data_reader: &mut impl BufRead) -> anyhow::Result<(ObjectType, usize)> {
        let mut object_type = Vec::new();
        data_reader.read_until(b' ', &mut object_type)?;
        if object_type.pop() != Some(b' ') {
            return Err(anyhow::anyhow!("missing space after object type"));
        }

        let object_type = std::str::from_utf8(&object_type)?;
        let object_type = ObjectType::try_from(object_type)?;

        let mut size = Vec::new();
        data_reader.read_until(b'\0', &mut size)?;
        if size.pop() != Some(b'\0') {
            return Err(anyhow::anyhow!("missing NUL after object length"));
        }

        let size = std::str::from_utf8(&size)?
            .parse::<usize>()
            .map_err(|_| anyhow::anyhow!("invalid object length"))?;

        Ok((object_type, size))
    }
}

impl TryFrom<&str> for ObjectType {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> anyhow::Result<Self> {
        match value {
            "blob" => Ok(ObjectType::Blob),
            "tree" => Ok(ObjectType::Tree),
            "commit" => Ok(ObjectType::Commit),
            "tag" => Ok(ObjectType::Tag),
            _ => Err(anyhow::anyhow!("Invalid object type: {value}")),
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(b"blob 11\0hello world", ObjectType::Blob, 11)]
    #[case(b"commit 0\0", ObjectType::Commit, 0)]
    #[case(b"tag 4\0body", ObjectType::Tag, 4)]
    fn parses_valid_headers(
        #[case] raw: &[u8],
        #[case] expected_type: ObjectType,
        #[case] expected_size: usize,
    ) {
        let mut reader = std::io::Cursor::new(raw);
        let (object_type, size) = ObjectType::parse_header(&mut reader).unwrap();
        assert_eq!(object_type, expected_type);
        assert_eq!(size, expected_size);
    }

    #[rstest]
    #[case(b"blob11\0" as &[u8])]
    #[case(b"sock 11\0")]
    #[case(b"blob xx\0")]
    #[case(b"blob 11")]
    fn rejects_malformed_headers(#[case] raw: &[u8]) {
        let mut reader = std::io::Cursor::new(raw);
        assert!(ObjectType::parse_header(&mut reader).is_err());
    }
}
