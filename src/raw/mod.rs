mod arena;
mod handle;
mod node;
mod raw_bplus_index;

pub(crate) use handle::Handle;
pub(crate) use raw_bplus_index::RawBPlusIndex;
