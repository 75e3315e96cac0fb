//! User command handlers.

use tabled::Tabled;

use bazaar_api::models::User;
use bazaar_core::{Command as CoreCommand, Console, Resource};

use crate::cli::{GlobalOpts, UsersArgs, UsersCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl UserRow {
    fn new(u: &User, color: bool) -> Self {
        Self {
            id: u.id.clone(),
            name: util::opt(u.name.as_ref()),
            email: util::opt(u.email.as_ref()),
            role: u.role.clone(),
            status: output::status(if u.is_banned { "banned" } else { "active" }, color),
        }
    }
}

fn detail(u: &User) -> String {
    output::detail(&[
        ("ID", u.id.clone()),
        ("Name", util::opt(u.name.as_ref())),
        ("Email", util::opt(u.email.as_ref())),
        ("Role", u.role.clone()),
        ("Banned", u.is_banned.to_string()),
        ("Created", util::opt(u.created_at.as_ref())),
    ])
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    console: &Console,
    args: UsersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(global.color);
    match args.command {
        UsersCommand::List { role } => {
            let users: Vec<User> = console
                .fetch_as(&Resource::users_with_roles(role))
                .await?;
            let out = output::render_list(
                global.output,
                &users,
                |u| UserRow::new(u, color),
                |u| u.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        UsersCommand::Show { id } => {
            let user: User = console.fetch_as(&Resource::User(id)).await?;
            let out = output::render_single(global.output, &user, detail, |u| u.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        UsersCommand::Ban { id } => {
            if !util::confirm(&format!("Ban user '{id}'?"), "users ban", global.yes)? {
                return Ok(());
            }
            console.execute(CoreCommand::BanUser { id: id.clone() }).await?;
            output::print_done(&format!("User {id} banned"), global.quiet);
            Ok(())
        }

        UsersCommand::Unban { id } => {
            console
                .execute(CoreCommand::UnbanUser { id: id.clone() })
                .await?;
            output::print_done(&format!("User {id} unbanned"), global.quiet);
            Ok(())
        }

        UsersCommand::Role { id, role } => {
            console
                .execute(CoreCommand::UpdateUserRole {
                    id: id.clone(),
                    role: role.clone(),
                })
                .await?;
            output::print_done(&format!("User {id} is now {role}"), global.quiet);
            Ok(())
        }
    }
}
