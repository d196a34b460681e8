mod headers;
mod time;

pub use self::headers::parse_headers;
pub use self::time::parse_duration;
