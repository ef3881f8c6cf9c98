mod resolve;
mod search;
mod watch;

pub use resolve::cmd_resolve;
pub use search::{build_params, cmd_search};
pub use watch::cmd_watch;
