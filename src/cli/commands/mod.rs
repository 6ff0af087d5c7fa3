mod align;
mod catalog;
mod init;
mod parse;
mod shows;

pub use align::{cmd_align, cmd_sync};
pub use catalog::{cmd_catalog_refresh, cmd_catalog_search};
pub use init::cmd_init;
pub use parse::cmd_parse;
pub use shows::{cmd_delete_show, cmd_list_shows, cmd_show, cmd_update_episode, parse_field_updates};
