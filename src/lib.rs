//! Re-readable HTTP request bodies.
//!
//! A [`RereadableBody`] buffers an inbound body once and hands out fresh
//! byte and character cursors over it on every call, while decoding the
//! submitted form (URL-encoded or `multipart/form-data`) into an ordered
//! [`MultiMap`] of parameters.

pub mod http;
pub mod server;

pub use http::{
    body::{BodyState, RereadableBody},
    error::BodyError,
    multipart::{FileItem, MultipartConfig, MultipartDispatcher, UploadRepository},
    params::{MultiMap, ParamValue, ParameterMap},
    protocol::charset::{Charset, DEFAULT_CHARACTER_ENCODING},
    protocol::content_type::MULTIPART_FORM_DATA,
    req::Request,
};
