//! Entry points behind each CLI subcommand.

mod list;
mod mount;
mod run;
mod services;
mod single;
mod update;

pub use list::list;
pub use mount::mount;
pub use run::run;
pub use services::{build_http_client, build_release_index};
pub use single::{select_mod, single};
pub use update::update;
