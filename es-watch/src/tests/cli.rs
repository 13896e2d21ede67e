use crate::cli::Cli;
use crate::commands::{Commands, GithubCommands, ProfileCommands};

use es_core::{ScanType, TargetType};

use clap::Parser;
use googletest::prelude::*;
use uuid::Uuid;

#[test]
fn given_scans_with_follow_when_parsed_then_flags_set() {
    let cli = Cli::try_parse_from(["es-watch", "scans", "--limit", "5", "--follow", "--pretty"])
        .unwrap();

    assert!(cli.pretty);
    assert!(matches!(
        cli.command,
        Commands::Scans {
            limit: Some(5),
            follow: true
        }
    ));
}

#[test]
fn given_start_without_types_when_parsed_then_quick_url_scan() {
    let cli = Cli::try_parse_from(["es-watch", "start", "https://target.example"]).unwrap();

    let Commands::Start {
        target,
        target_type,
        scan_type,
    } = cli.command
    else {
        panic!("expected start");
    };
    assert_that!(target.as_str(), eq("https://target.example"));
    assert_that!(target_type, eq(TargetType::Url));
    assert_that!(scan_type, eq(ScanType::Quick));
}

#[test]
fn given_unknown_scan_type_when_parsed_then_rejected() {
    let result = Cli::try_parse_from([
        "es-watch",
        "start",
        "https://target.example",
        "--scan-type",
        "thorough",
    ]);

    assert!(result.is_err());
}

#[test]
fn given_malformed_scan_id_when_parsed_then_rejected() {
    assert!(Cli::try_parse_from(["es-watch", "scan", "not-a-uuid"]).is_err());
}

#[test]
fn given_scan_id_when_parsed_then_uuid_kept() {
    let id = Uuid::new_v4();

    let cli = Cli::try_parse_from(["es-watch", "cancel", &id.to_string()]).unwrap();

    assert!(matches!(cli.command, Commands::Cancel { id: parsed } if parsed == id));
}

#[test]
fn given_callback_with_code_only_when_parsed_then_state_required() {
    let result = Cli::try_parse_from(["es-watch", "github", "callback", "--code", "abc"]);

    assert!(result.is_err());
}

#[test]
fn given_callback_url_and_code_when_parsed_then_conflict() {
    let result = Cli::try_parse_from([
        "es-watch",
        "github",
        "callback",
        "--url",
        "http://localhost/cb?code=a&state=b",
        "--code",
        "a",
        "--state",
        "b",
    ]);

    assert!(result.is_err());
}

#[test]
fn given_remote_repos_when_parsed_then_remote_set() {
    let cli = Cli::try_parse_from(["es-watch", "github", "repos", "--remote"]).unwrap();

    assert!(matches!(
        cli.command,
        Commands::Github {
            action: GithubCommands::Repos { remote: true }
        }
    ));
}

#[test]
fn given_profile_set_with_name_when_parsed_then_name_captured() {
    let cli = Cli::try_parse_from(["es-watch", "profile", "set", "--name", "Grace Hopper"]).unwrap();

    let Commands::Profile {
        action: ProfileCommands::Set { name, avatar_url },
    } = cli.command
    else {
        panic!("expected profile set");
    };
    assert_that!(name.as_deref(), some(eq("Grace Hopper")));
    assert_that!(avatar_url, none());
}

#[test]
fn given_profile_set_without_fields_when_parsed_then_rejected() {
    assert!(Cli::try_parse_from(["es-watch", "profile", "set"]).is_err());
}
