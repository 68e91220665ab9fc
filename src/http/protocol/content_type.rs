/// Prefix identifying a multipart form submission.
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Whether a raw `Content-Type` value starts with [`MULTIPART_FORM_DATA`].
/// Media types are case-insensitive, so the prefix is compared ignoring
/// ASCII case.
pub fn is_multipart_form_data(content_type: &str) -> bool {
    content_type
        .trim_start()
        .as_bytes()
        .get(..MULTIPART_FORM_DATA.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(MULTIPART_FORM_DATA.as_bytes()))
}

/// Parsed `Content-Type` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// `type/subtype`, lowercased
    pub essence: String,
    pub parameters: Vec<(String, String)>,
}

impl ContentType {
    pub fn parse(s: &str) -> Self {
        let mut parts = s.split(';');
        let essence = parts.next().unwrap_or("").trim().to_ascii_lowercase();

        ContentType {
            essence,
            parameters: parts
                .filter(|p| !p.trim().is_empty())
                .map(|p| {
                    let (k, v) = p.split_once('=').unwrap_or((p, ""));
                    (k.trim().to_string(), v.trim().trim_matches('"').to_string())
                })
                .collect(),
        }
    }

    /// Case-insensitive lookup of a media type parameter.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The declared `charset` parameter, if any.
    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset").filter(|c| !c.is_empty())
    }
}
