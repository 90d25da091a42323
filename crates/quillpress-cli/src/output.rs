use anyhow::Result;
use colored::Colorize;
use quillpress_auth::{CachedSession, PermissionSet};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_permissions(permissions: &PermissionSet) {
    println!("{}: {}", "Landing route".cyan(), permissions.default_route);

    let granted: Vec<&str> = permissions
        .capabilities
        .granted()
        .map(|capability| capability.as_str())
        .collect();
    println!("{}: {}", "Capabilities".cyan(), granted.join(", "));

    let mut builder = Builder::default();
    builder.push_record(["Route", "Kind"]);
    for route in &permissions.allowed_routes {
        let kind = if route.contains(':') { "template" } else { "prefix" };
        builder.push_record([route.as_str(), kind]);
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{table}");
}

pub fn print_session(session: &CachedSession, now: OffsetDateTime) {
    let profile = &session.profile;
    println!("{}: {}", "Identity".cyan(), profile.id);
    println!("{}: {}", "Email".cyan(), profile.email);
    println!("{}: {}", "Display name".cyan(), profile.display_name);
    println!("{}: {}", "Role".cyan(), profile.role);
    println!("{}: {}", "Cached at".cyan(), timestamp(session.last_updated));
    println!("{}: {}", "Expires at".cyan(), timestamp(session.expires_at));
    println!(
        "{}: {}s",
        "Remaining".cyan(),
        session.remaining_at(now).whole_seconds()
    );
    print_permissions(&session.permissions);
}

pub fn print_sessions(sessions: &[CachedSession], now: OffsetDateTime) {
    if sessions.is_empty() {
        println!("No cached sessions.");
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(["Identity", "Email", "Role", "Expires at", "Remaining"]);
    for session in sessions {
        builder.push_record([
            session.profile.id.clone(),
            session.profile.email.clone(),
            session.profile.role.to_string(),
            timestamp(session.expires_at),
            format!("{}s", session.remaining_at(now).whole_seconds()),
        ]);
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{table}");
}

fn timestamp(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| at.to_string())
}
