use std::fmt;

use crate::http::error::BodyError;

/// Encoding used when the request does not declare one.
pub const DEFAULT_CHARACTER_ENCODING: &str = "utf-8";

/// Character encodings a request body may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Charset {
    #[default]
    Utf8,
    Ascii,
    Latin1,
}

impl Charset {
    /// Looks up a charset label, ignoring case, quotes and surrounding space.
    pub fn from_name(name: &str) -> Option<Self> {
        let label = name.trim().trim_matches('"').to_ascii_lowercase();
        match label.as_str() {
            "utf-8" | "utf8" => Some(Charset::Utf8),
            "us-ascii" | "ascii" => Some(Charset::Ascii),
            "iso-8859-1" | "iso8859-1" | "iso_8859-1" | "latin1" | "l1" => Some(Charset::Latin1),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Charset::Utf8 => DEFAULT_CHARACTER_ENCODING,
            Charset::Ascii => "us-ascii",
            Charset::Latin1 => "iso-8859-1",
        }
    }

    /// Strict decode; bytes outside the charset are an error.
    pub fn decode(&self, bytes: &[u8]) -> Result<String, BodyError> {
        match self {
            Charset::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| BodyError::Decode(format!("invalid utf-8 text: {}", e))),
            Charset::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(pos) => Err(BodyError::Decode(format!(
                    "non-ascii byte 0x{:02X} at offset {}",
                    bytes[pos], pos
                ))),
                None => Ok(bytes.iter().map(|&b| b as char).collect()),
            },
            Charset::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
