//! Request body codecs.
//!
//! - [`chunked`]: de-chunking of `Transfer-Encoding: chunked` bodies
//! - [`multipart`]: zero-copy `multipart/form-data` parsing
//!
//! Both work on a body that is already fully received; neither streams.

pub mod chunked;
pub mod multipart;

pub use chunked::DecodedBody;
pub use multipart::FormDataItem;
pub use multipart::Multipart;
