mod compress;
mod repl;

pub(crate) use compress::{CompressRequest, run_compress_mode};
pub(crate) use repl::run_repl_mode;
