/// Coarse failure classes surfaced to callers outside the crate.
///
/// Every layer keeps its own error type; this is the only place the three
/// classes exist, so boundary code can map them without inspecting variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The image bytes could not be decoded.
    ImageLoad,
    /// The detector model could not be read or deserialized.
    Serialization,
    /// Anything else, scan failures included.
    Unknown,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::ImageLoad => "image load error",
            ErrorKind::Serialization => "serialization error",
            ErrorKind::Unknown => "unknown error",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names() {
        assert_eq!(ErrorKind::ImageLoad.to_string(), "image load error");
        assert_eq!(ErrorKind::Serialization.to_string(), "serialization error");
        assert_eq!(ErrorKind::Unknown.to_string(), "unknown error");
    }
}
