//! Profiles subcommand implementation.
//!
//! Handles `trawl profiles` for managing scan profiles.

use crate::cli::Context;
use crate::config::Profile;
use crate::error::{CliResult, ProfileError};
use crate::output;
use crate::scanner::{DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT_MS};
use clap::{Parser, Subcommand};
use std::io::{self, Write};

/// Manage scan profiles.
#[derive(Parser, Debug)]
pub struct ProfilesCommand {
    #[command(subcommand)]
    pub action: ProfilesAction,
}

/// Profile management actions.
#[derive(Subcommand, Debug)]
pub enum ProfilesAction {
    /// List all available profiles
    List,

    /// Show details of a specific profile
    Show {
        /// Profile name
        name: String,
    },

    /// Create a new profile
    Create {
        /// Profile name
        name: String,

        /// Ports to scan
        #[arg(short, long, default_value = "1-1000")]
        ports: String,

        /// Hosts scanned at once
        #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,

        /// Ports probed at once on each host
        #[arg(long)]
        port_concurrency: Option<usize>,

        /// Timeout in milliseconds
        #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_MS)]
        timeout: u64,

        /// Enable banner grabbing
        #[arg(short, long)]
        banner: bool,

        /// Probes per second (0 = unlimited)
        #[arg(short, long, default_value = "0")]
        rate_limit: u32,

        /// Profile description
        #[arg(short = 'd', long)]
        description: Option<String>,
    },

    /// Delete a profile
    Delete {
        /// Profile name
        name: String,

        /// Skip confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

impl ProfilesCommand {
    pub fn execute(&self, ctx: &Context) -> CliResult<()> {
        match &self.action {
            ProfilesAction::List => list_profiles(ctx),
            ProfilesAction::Show { name } => show_profile(ctx, name),
            ProfilesAction::Create {
                name,
                ports,
                concurrency,
                port_concurrency,
                timeout,
                banner,
                rate_limit,
                description,
            } => {
                let profile = Profile {
                    name: name.clone(),
                    description: description.clone().unwrap_or_default(),
                    ports: ports.clone(),
                    concurrency: *concurrency,
                    port_concurrency: *port_concurrency,
                    timeout_ms: *timeout,
                    banner: *banner,
                    rate_limit: *rate_limit,
                };
                ctx.profiles()?.create(profile)?;
                if !ctx.quiet {
                    output::print_success(&format!("Profile '{}' created", name));
                }
                Ok(())
            }
            ProfilesAction::Delete { name, yes } => delete_profile(ctx, name, *yes),
        }
    }
}

fn list_profiles(ctx: &Context) -> CliResult<()> {
    let manager = ctx.profiles()?;

    if !ctx.quiet {
        println!(
            "\n{:<12} {:<8} {:<24} {}",
            "NAME", "BUILTIN", "PORTS", "DESCRIPTION"
        );
        println!("{}", "-".repeat(78));
    }

    for profile in manager.list() {
        println!(
            "{:<12} {:<8} {:<24} {}",
            profile.name,
            if Profile::is_builtin(&profile.name) { "yes" } else { "" },
            ellipsize(&profile.ports, 24),
            ellipsize(&profile.description, 32)
        );
    }

    if !ctx.quiet {
        println!();
    }
    Ok(())
}

fn show_profile(ctx: &Context, name: &str) -> CliResult<()> {
    let manager = ctx.profiles()?;
    let profile = manager
        .get(name)
        .ok_or_else(|| ProfileError::NotFound(name.to_string()))?;

    println!("\nProfile: {}", profile.name);
    println!("{}", "=".repeat(40));
    println!("Description:       {}", profile.description);
    println!("Ports:             {}", profile.ports);
    println!("Host concurrency:  {}", profile.concurrency);
    println!(
        "Port concurrency:  {}",
        profile
            .port_concurrency
            .map_or_else(|| "same as hosts".to_string(), |n| n.to_string())
    );
    println!("Timeout:           {} ms", profile.timeout_ms);
    println!("Banner grab:       {}", if profile.banner { "yes" } else { "no" });
    println!(
        "Rate limit:        {}",
        if profile.rate_limit == 0 {
            "unlimited".to_string()
        } else {
            format!("{} probes/s", profile.rate_limit)
        }
    );
    println!();

    Ok(())
}

fn delete_profile(ctx: &Context, name: &str, yes: bool) -> CliResult<()> {
    let mut manager = ctx.profiles()?;
    if manager.get(name).is_none() {
        return Err(ProfileError::NotFound(name.to_string()).into());
    }

    if !yes {
        print!("Delete profile '{}'? [y/N] ", name);
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    manager.delete(name)?;
    if !ctx.quiet {
        output::print_success(&format!("Profile '{}' deleted", name));
    }
    Ok(())
}

fn ellipsize(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppSettings, Paths};

    fn context(dir: &tempfile::TempDir) -> Context {
        Context {
            paths: Paths::under(dir.path()).unwrap(),
            settings: AppSettings::default(),
            verbose: false,
            quiet: true,
        }
    }

    #[test]
    fn test_create_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);

        let create = ProfilesCommand {
            action: ProfilesAction::Create {
                name: "lab".to_string(),
                ports: "22,3389".to_string(),
                concurrency: 32,
                port_concurrency: Some(2),
                timeout: 300,
                banner: true,
                rate_limit: 0,
                description: None,
            },
        };
        create.execute(&ctx).unwrap();
        assert_eq!(ctx.profiles().unwrap().get("lab").unwrap().port_concurrency, Some(2));

        let delete = ProfilesCommand {
            action: ProfilesAction::Delete {
                name: "lab".to_string(),
                yes: true,
            },
        };
        delete.execute(&ctx).unwrap();
        assert!(ctx.profiles().unwrap().get("lab").is_none());
    }

    #[test]
    fn test_show_missing_profile() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        assert!(show_profile(&ctx, "nope").is_err());
    }

    #[test]
    fn test_ellipsize() {
        assert_eq!(ellipsize("22,80", 24), "22,80");
        assert_eq!(ellipsize("1,2,3,4,5,6,7,8,9", 8), "1,2,3...");
    }
}
