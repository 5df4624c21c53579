mod bitrate;

pub use bitrate::{BITRATE_CODECS, apply_max_bitrate};
