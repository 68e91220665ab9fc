pub mod body;
pub mod error;
pub mod form;
pub mod meta;
pub mod multipart;
pub mod params;
pub mod protocol;
pub mod req;
pub mod res;
