// Endpoint groups, one module per back-office area. Each adds inherent
// methods to `AdminClient` and returns normalized, typed payloads.

mod categories;
mod dashboard;
mod kyc;
mod listings;
mod reports;
mod riders;
mod session;
mod users;
mod vendors;

use crate::error::Error;

/// `{prefix}/{id}`, refusing ids that would escape the path segment.
pub(crate) fn with_id(prefix: &str, id: &str) -> Result<String, Error> {
    let id = id.trim();
    if id.is_empty() {
        return Err(Error::invalid("id", "an id is required"));
    }
    if id.contains(['/', '?', '#']) {
        return Err(Error::invalid("id", format!("'{id}' is not a valid id")));
    }
    Ok(format!("{prefix}/{id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_single_segments() {
        assert_eq!(with_id("ban", " u1 ").ok().as_deref(), Some("ban/u1"));
        assert!(with_id("ban", "").is_err());
        assert!(with_id("ban", "../login").is_err());
        assert!(with_id("ban", "u1?x=1").is_err());
    }
}
