pub mod charset;
pub mod content_type;
pub mod header;
pub mod method;
pub mod status;
pub mod version;
