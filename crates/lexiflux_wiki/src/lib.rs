mod extract;

pub use extract::{StreamError, stream_pages};
