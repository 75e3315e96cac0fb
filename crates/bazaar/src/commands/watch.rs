//! Follow one resource through the cache and print every settled value.

use std::time::Duration;

use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::Value;

use bazaar_core::{AuthState, Console, Resource, ResourceState};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs, WatchTarget};
use crate::error::CliError;
use crate::output;

fn resource(target: WatchTarget) -> Resource {
    match target {
        WatchTarget::Dashboard => Resource::Dashboard,
        WatchTarget::Users => Resource::users(),
        WatchTarget::Riders => Resource::Riders,
        WatchTarget::RiderStats => Resource::RiderStats,
        WatchTarget::RiderMonthly => Resource::RiderMonthly,
        WatchTarget::VendorApplications => Resource::VendorApplications,
        WatchTarget::Listings => Resource::Listings,
        WatchTarget::Kyc => Resource::Kyc,
        WatchTarget::Reports => Resource::Reports,
        WatchTarget::Categories => Resource::Categories,
    }
}

#[derive(Serialize)]
struct Update<'a> {
    key: String,
    fetched_at: Option<DateTime<Utc>>,
    data: &'a Value,
}

/// Tracks what has been printed so repeated states are skipped.
#[derive(Default)]
struct Printed {
    fetched_at: Option<DateTime<Utc>>,
    error: Option<String>,
    count: usize,
}

impl Printed {
    /// Print `state` if it carries something new. Returns whether a
    /// data update was printed.
    fn show(&mut self, key: &str, state: &ResourceState, global: &GlobalOpts, color: bool) -> bool {
        if state.is_loading {
            return false;
        }

        if let Some(err) = &state.error {
            let text = err.to_string();
            if self.error.as_deref() != Some(text.as_str()) {
                let line = format!("{key}: {text} ({})", err.kind);
                if color {
                    eprintln!("{}", line.red());
                } else {
                    eprintln!("{line}");
                }
                self.error = Some(text);
            }
        } else {
            self.error = None;
        }

        let Some(data) = state.data.as_deref() else {
            return false;
        };
        if state.last_fetched_at.is_some() && state.last_fetched_at == self.fetched_at {
            return false;
        }
        self.fetched_at = state.last_fetched_at;
        self.count += 1;

        let update = Update {
            key: key.to_owned(),
            fetched_at: state.last_fetched_at,
            data,
        };
        let out = match global.output {
            OutputFormat::Json => output::render_json(&update, false),
            OutputFormat::JsonCompact => output::render_json(&update, true),
            OutputFormat::Table | OutputFormat::Plain => {
                let at = state
                    .last_fetched_at
                    .unwrap_or_else(Utc::now)
                    .format("%H:%M:%S");
                format!("[{at}] {key} {}", output::render_json(data, true))
            }
        };
        output::print_output(&out, global.quiet);
        true
    }
}

pub async fn handle(
    console: &Console,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if console.current_admin().is_none() {
        return Err(CliError::NotSignedIn);
    }

    let resource = resource(args.resource);
    let config = match args.interval {
        Some(secs) => resource
            .recommended_revalidation()
            .with_poll_interval(Duration::from_secs(secs)),
        None => resource.recommended_revalidation(),
    };
    let key = resource.key().to_string();
    let color = output::should_color(global.color);

    let mut auth = console.auth_state();
    let mut sub = console.subscribe(&resource, config);
    tracing::info!(key = %key, "watching");

    let mut printed = Printed::default();
    let mut state = sub.state();
    loop {
        if printed.show(&key, &state, global, color) {
            if let Some(limit) = args.count {
                if printed.count >= limit {
                    break;
                }
            }
        }
        // A rejected token ends the watch.
        if *auth.borrow_and_update() != AuthState::SignedIn {
            return Err(CliError::NotSignedIn);
        }

        tokio::select! {
            next = sub.changed() => match next {
                Some(next) => state = next,
                None => break,
            },
            changed = auth.changed() => {
                if changed.is_err() {
                    return Err(CliError::NotSignedIn);
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}
