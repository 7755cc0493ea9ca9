mod prefix;

pub use prefix::{derive_prefix, DEFAULT_PREFIX, MAX_PREFIX_LEN};
