use std::collections::HashMap;

use crate::http::protocol::{
    content_type::ContentType, header::HeaderKey, method::HttpMethod, version::HttpVersion,
};

/// Request-line and header data parsed ahead of the body
#[derive(Debug, Clone)]
pub struct HttpMetadata {
    pub method: HttpMethod,
    pub path: String,
    pub version: HttpVersion,
    pub headers: HashMap<HeaderKey, String>,
    pub content_type: Option<ContentType>,
    pub length: usize,
}

impl HttpMetadata {
    pub fn header(&self, key: &str) -> Option<&str> {
        HeaderKey::from_str(key)
            .and_then(|k| self.headers.get(&k))
            .map(String::as_str)
    }

    /// Raw `Content-Type` header as received
    pub fn raw_content_type(&self) -> Option<&str> {
        self.headers.get(&HeaderKey::ContentType).map(String::as_str)
    }

    /// `charset` parameter of the content type, if declared
    pub fn character_encoding(&self) -> Option<&str> {
        self.content_type.as_ref().and_then(ContentType::charset)
    }
}
