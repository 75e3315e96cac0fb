//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::{Input, Select};

use bazaar_config::{Config, Profile, SessionStoreKind};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::active_profile_name;
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

const SETTABLE_KEYS: &str = "api_url, email, timeout, insecure, ca_cert, session_store, \
     cache_grace, admin_path, listings_path, vendor_path, rider_path";

// ── Helpers ─────────────────────────────────────────────────────────

fn store_name(kind: SessionStoreKind) -> &'static str {
    match kind {
        SessionStoreKind::Keyring => "keyring",
        SessionStoreKind::File => "file",
        SessionStoreKind::Memory => "memory",
    }
}

fn parse_store(value: &str) -> Result<SessionStoreKind, CliError> {
    match value.to_ascii_lowercase().as_str() {
        "keyring" => Ok(SessionStoreKind::Keyring),
        "file" => Ok(SessionStoreKind::File),
        "memory" => Ok(SessionStoreKind::Memory),
        _ => Err(CliError::Validation {
            field: "session_store".into(),
            reason: "must be 'keyring', 'file' or 'memory'".into(),
        }),
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, value: &str, hint: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: hint.into(),
    })
}

/// Profiles in name order, for stable output.
fn sorted_profiles(cfg: &Config) -> Vec<(&String, &Profile)> {
    let mut profiles: Vec<_> = cfg.profiles.iter().collect();
    profiles.sort_by(|a, b| a.0.cmp(b.0));
    profiles
}

fn format_config(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    for (name, p) in sorted_profiles(cfg) {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "api_url = \"{}\"", p.api_url);
        if let Some(ref email) = p.email {
            let _ = writeln!(out, "email = \"{email}\"");
        }
        let _ = writeln!(out, "session_store = \"{}\"", store_name(p.session_store));
        let paths = [
            ("admin_path", &p.admin_path),
            ("listings_path", &p.listings_path),
            ("vendor_path", &p.vendor_path),
            ("rider_path", &p.rider_path),
        ];
        for (key, value) in paths {
            if let Some(v) = value {
                let _ = writeln!(out, "{key} = \"{v}\"");
            }
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if p.insecure {
            let _ = writeln!(out, "insecure = true");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(grace) = p.cache_grace {
            let _ = writeln!(out, "cache_grace = {grace}");
        }
    }

    out.trim_end().to_owned()
}

fn apply(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key.replace('-', "_").as_str() {
        "api_url" => profile.api_url = value,
        "email" => profile.email = Some(value),
        "timeout" => {
            profile.timeout = Some(parse_field("timeout", &value, "must be a number (seconds)")?);
        }
        "insecure" => {
            profile.insecure = parse_field("insecure", &value, "must be 'true' or 'false'")?;
        }
        "ca_cert" => profile.ca_cert = Some(value.into()),
        "session_store" => profile.session_store = parse_store(&value)?,
        "cache_grace" => {
            profile.cache_grace =
                Some(parse_field("cache_grace", &value, "must be a number (seconds)")?);
        }
        "admin_path" => profile.admin_path = Some(value),
        "listings_path" => profile.listings_path = Some(value),
        "vendor_path" => profile.vendor_path = Some(value),
        "rider_path" => profile.rider_path = Some(value),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!("unknown config key '{other}'. Valid keys: {SETTABLE_KEYS}"),
            });
        }
    }
    Ok(())
}

fn init() -> Result<(), CliError> {
    let path = bazaar_config::config_path();
    eprintln!("bazaar configuration");
    eprintln!("   Config path: {}\n", path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let api_url: String = Input::new()
        .with_prompt("API URL")
        .default("https://api.example.com".into())
        .interact_text()
        .map_err(prompt_err)?;

    let email: String = Input::new()
        .with_prompt("Admin email (optional)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let choices = &[
        "System keyring (recommended)",
        "File in the data directory",
        "Don't remember sessions",
    ];
    let selection = Select::new()
        .with_prompt("Where to keep the session token?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    let session_store = match selection {
        0 => SessionStoreKind::Keyring,
        1 => SessionStoreKind::File,
        _ => SessionStoreKind::Memory,
    };

    let mut profile = Profile::new(api_url);
    profile.email = (!email.trim().is_empty()).then(|| email.trim().to_owned());
    profile.session_store = session_store;

    let mut cfg = bazaar_config::load_config_or_default();
    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());
    bazaar_config::save_config(&cfg)?;

    eprintln!("\nConfiguration written to {}", path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Next: bazaar login");
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let cfg = bazaar_config::load_config()?;
            let out = output::render_single(global.output, &cfg, format_config, |_| {
                "config".into()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = bazaar_config::load_config_or_default();
            let profile_name = active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            apply(profile, &key, value)?;
            bazaar_config::save_config(&cfg)?;
            output::print_done(&format!("Set {key} on profile '{profile_name}'"), global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = bazaar_config::load_config_or_default();
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: bazaar config init");
                return Ok(());
            }
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            let lines: Vec<String> = sorted_profiles(&cfg)
                .into_iter()
                .map(|(name, p)| {
                    let marker = if name == default { " *" } else { "" };
                    format!("{name}{marker}\t{}", p.api_url)
                })
                .collect();
            output::print_output(&lines.join("\n"), global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = bazaar_config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                let available: Vec<_> = sorted_profiles(&cfg)
                    .into_iter()
                    .map(|(n, _)| n.clone())
                    .collect();
                return Err(CliError::ProfileNotFound {
                    name,
                    available: if available.is_empty() {
                        "(none)".into()
                    } else {
                        available.join(", ")
                    },
                });
            }
            cfg.default_profile = Some(name.clone());
            bazaar_config::save_config(&cfg)?;
            output::print_done(&format!("Default profile set to '{name}'"), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", bazaar_config::config_path().display());
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_parses_typed_values() {
        let mut p = Profile::new("https://api.example.com");
        apply(&mut p, "timeout", "12".into()).unwrap();
        apply(&mut p, "session-store", "FILE".into()).unwrap();
        apply(&mut p, "insecure", "true".into()).unwrap();
        assert_eq!(p.timeout, Some(12));
        assert_eq!(p.session_store, SessionStoreKind::File);
        assert!(p.insecure);

        assert!(matches!(
            apply(&mut p, "timeout", "soon".into()),
            Err(CliError::Validation { .. })
        ));
        assert!(matches!(
            apply(&mut p, "password", "x".into()),
            Err(CliError::Validation { .. })
        ));
    }

    #[test]
    fn show_lists_profiles_in_order() {
        let mut cfg = Config::default();
        cfg.profiles.insert("staging".into(), Profile::new("https://staging"));
        cfg.profiles.insert("prod".into(), Profile::new("https://prod"));
        let text = format_config(&cfg);
        let prod = text.find("[profiles.prod]").unwrap();
        let staging = text.find("[profiles.staging]").unwrap();
        assert!(prod < staging);
        assert!(text.contains("session_store = \"keyring\""));
    }
}
