// File: sra-core/src/validators.rs
//! Syntax checks for identifiers that arrive in action values.
//!
//! These run before any backend call so a malformed trigger payload fails
//! fast as invalid input instead of surfacing later as an opaque 400 or 404.
//!
//! License: MIT OR APACHE 2.0

use once_cell::sync::Lazy;
use regex::Regex;

// Optional `domain.tld:` prefix for domain-scoped projects, then 6-30 chars.
static PROJECT_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[a-z0-9][a-z0-9.-]*[a-z0-9]:)?[a-z][a-z0-9-]{4,28}[a-z0-9]$")
        .expect("project id pattern is valid")
});

static SQL_INSTANCE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z](?:[a-z0-9-]*[a-z0-9])?$").expect("instance pattern is valid"));

// `<parent>/sources/S/findings/F` or `<parent>/assets/A`, optionally naming the marks resource.
static MARKS_TARGET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:organizations|folders|projects)/[^/]+/(?:sources/[^/]+/findings|assets)/[^/]+(?:/securityMarks)?$",
    )
    .expect("marks target pattern is valid")
});

/// Cloud SQL caps instance names (project id included) at 98 characters.
pub const MAX_SQL_INSTANCE_NAME: usize = 98;

/// Checks a GCP project id, returning the reason it is rejected.
pub fn validate_project_id(project: &str) -> Result<(), String> {
    if project.is_empty() {
        return Err("project id is empty".to_string());
    }
    if !PROJECT_ID.is_match(project) {
        return Err(format!("'{project}' is not a valid project id"));
    }
    Ok(())
}

pub fn validate_sql_instance_name(instance: &str) -> Result<(), String> {
    if instance.is_empty() {
        return Err("instance name is empty".to_string());
    }
    if instance.len() > MAX_SQL_INSTANCE_NAME {
        return Err(format!(
            "instance name is {} characters, maximum is {MAX_SQL_INSTANCE_NAME}",
            instance.len()
        ));
    }
    if !SQL_INSTANCE_NAME.is_match(instance) {
        return Err(format!("'{instance}' is not a valid Cloud SQL instance name"));
    }
    Ok(())
}

/// Accepts a finding or asset name, or the name of its marks resource.
pub fn validate_marks_target(target: &str) -> Result<(), String> {
    if MARKS_TARGET.is_match(target) {
        Ok(())
    } else {
        Err(format!("'{target}' is not a valid finding or asset name"))
    }
}
