mod control;
mod status;
mod upload;

pub(crate) use control::*;
pub(crate) use status::*;
pub(crate) use upload::*;
