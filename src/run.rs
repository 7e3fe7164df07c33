mod cli;
mod tui;

pub(crate) use cli::{as_cli, shellexpand, CliContext};
pub(crate) use tui::as_tui;
