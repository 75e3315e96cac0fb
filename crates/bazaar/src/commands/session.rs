//! Sign-in, sign-out and identity.

use dialoguer::Input;
use secrecy::SecretString;

use bazaar_api::AdminProfile;
use bazaar_core::Console;

use crate::cli::{GlobalOpts, LoginArgs};
use crate::config::Target;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn login(
    console: &Console,
    target: &Target,
    args: LoginArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let email = match args.email.or_else(|| target.email.clone()) {
        Some(email) => email,
        None => Input::<String>::new()
            .with_prompt("Email")
            .interact_text()
            .map_err(util::prompt_err)?,
    };

    let password = match std::env::var(&args.password_env) {
        Ok(pw) => pw,
        Err(_) => rpassword::prompt_password("Password: ").map_err(util::prompt_err)?,
    };

    let admin = console
        .sign_in(&email, SecretString::from(password))
        .await?;
    output::print_done(
        &format!("Signed in as {} ({})", admin.email, target.profile_name),
        global.quiet,
    );
    Ok(())
}

pub fn logout(console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    console.sign_out()?;
    output::print_done("Signed out", global.quiet);
    Ok(())
}

pub fn whoami(console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    let admin = console.current_admin().ok_or(CliError::NotSignedIn)?;
    let out = output::render_single(
        global.output,
        &admin,
        |a: &AdminProfile| {
            output::detail(&[
                ("ID", a.id.clone()),
                ("Email", a.email.clone()),
                ("Name", a.name.clone()),
                ("Role", a.role.clone()),
            ])
        },
        |a| a.email.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
