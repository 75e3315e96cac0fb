//! Command dispatch: bridges CLI args -> console reads and commands -> output.

pub mod categories;
pub mod config_cmd;
pub mod dashboard;
pub mod kyc;
pub mod listings;
pub mod reports;
pub mod riders;
pub mod session;
pub mod users;
pub mod util;
pub mod vendors;
pub mod watch;

use bazaar_core::Console;

use crate::cli::{Command, GlobalOpts};
use crate::config::Target;
use crate::error::CliError;

/// Dispatch an API-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    console: &Console,
    target: &Target,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => session::login(console, target, args, global).await,
        Command::Logout => session::logout(console, global),
        Command::Whoami => session::whoami(console, global),
        Command::Dashboard => dashboard::handle(console, global).await,
        Command::Users(args) => users::handle(console, args, global).await,
        Command::Riders(args) => riders::handle(console, args, global).await,
        Command::Vendors(args) => vendors::handle(console, args, global).await,
        Command::Listings(args) => listings::handle(console, args, global).await,
        Command::Kyc(args) => kyc::handle(console, args, global).await,
        Command::Reports(args) => reports::handle(console, args, global).await,
        Command::Categories(args) => categories::handle(console, args, global).await,
        Command::Watch(args) => watch::handle(console, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
