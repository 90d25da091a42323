use anyhow::Result;
use colored::Colorize;
use quillpress_auth::policy::{policy_table, resolve};
use quillpress_auth::{Role, RouteMatcher};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;
use crate::output::{print_json, print_permissions};

#[derive(Serialize)]
struct CheckResult<'a> {
    role: Role,
    path: &'a str,
    allowed: bool,
    matched: Option<&'a str>,
}

pub fn roles(format: OutputFormat) -> Result<()> {
    let policies = policy_table();
    if format == OutputFormat::Json {
        let entries: Vec<_> = policies
            .iter()
            .map(|(role, permissions)| serde_json::json!({ "role": role, "permissions": permissions }))
            .collect();
        return print_json(&entries);
    }

    let mut builder = Builder::default();
    builder.push_record(["Role", "Landing route", "Routes", "Capabilities"]);
    for (role, permissions) in &policies {
        builder.push_record([
            role.to_string(),
            permissions.default_route.clone(),
            permissions.allowed_routes.len().to_string(),
            permissions.capabilities.granted().count().to_string(),
        ]);
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

pub fn resolve_role(role: Role, format: OutputFormat) -> Result<()> {
    let permissions = resolve(role);
    match format {
        OutputFormat::Json => print_json(&permissions),
        OutputFormat::Table => {
            println!("{}: {}", "Role".cyan(), role);
            print_permissions(&permissions);
            Ok(())
        }
    }
}

/// Returns whether `role` may open `path`.
pub fn check(role: Role, path: &str, format: OutputFormat) -> Result<bool> {
    let permissions = resolve(role);
    let matched = RouteMatcher::new().first_match(&permissions, path);
    let allowed = matched.is_some();

    match format {
        OutputFormat::Json => print_json(&CheckResult {
            role,
            path,
            allowed,
            matched,
        })?,
        OutputFormat::Table => match matched {
            Some(pattern) => println!(
                "{} {} may open {} (via {})",
                "✓".green(),
                role.to_string().cyan(),
                path.cyan(),
                pattern
            ),
            None => println!(
                "{} {} may not open {}",
                "✗".red(),
                role.to_string().cyan(),
                path.cyan()
            ),
        },
    }
    Ok(allowed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_reports_decision() {
        assert!(check(Role::Admin, "/admin/users", OutputFormat::Json).unwrap());
        assert!(!check(Role::Writer, "/admin", OutputFormat::Json).unwrap());
        assert!(check(Role::User, "/article/7/comments", OutputFormat::Table).unwrap());
    }
}
