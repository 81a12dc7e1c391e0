//! Command-line flags, environment fallbacks, and resolved run settings.

use std::path::{Path, PathBuf};

use clap::Parser;
use lighthouse_sheet_core::SheetTarget;

use crate::CliResult;
use crate::auth::credentials_path;
use crate::sheets::DEFAULT_SHEETS_API_URL;

#[derive(Parser, Debug)]
#[command(
    name = "lighthouse-sheet",
    version,
    about = "Append a Lighthouse result to a Google Sheet"
)]
pub(crate) struct Cli {
    /// Path to the Lighthouse JSON report.
    #[arg(long = "lighthouse-result", env = "LIGHTHOUSE_RESULT_PATH")]
    lighthouse_result: Option<PathBuf>,
    /// Spreadsheet id to append to.
    #[arg(long, env = "SPREADSHEET_ID")]
    spreadsheet_id: Option<String>,
    /// Sheet (tab) name within the spreadsheet.
    #[arg(long, env = "SHEET_NAME")]
    sheet_name: Option<String>,
    /// Project label; defaults to the repository directory name.
    #[arg(long, env = "PROJECT_NAME")]
    project: Option<String>,
    /// Repository to read commit metadata from.
    #[arg(long, env = "REPO_DIR", default_value = ".")]
    repo_dir: PathBuf,
    /// Service-account key file.
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    credentials: Option<PathBuf>,
    /// Sheets API base URL.
    #[arg(long, env = "SHEETS_API_URL", default_value = DEFAULT_SHEETS_API_URL)]
    sheets_api_url: String,
    /// Print the composed row instead of appending it.
    #[arg(long)]
    dry_run: bool,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Settings {
    pub(crate) report_path: PathBuf,
    pub(crate) repo_dir: PathBuf,
    pub(crate) project: String,
    pub(crate) mode: Mode,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Mode {
    DryRun,
    Publish(PublishSettings),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PublishSettings {
    pub(crate) target: SheetTarget,
    pub(crate) credentials: PathBuf,
    pub(crate) sheets_api_url: String,
}

/// Validate parsed flags and fill in defaults.
pub(crate) fn resolve(cli: Cli) -> CliResult<Settings> {
    let report_path = cli
        .lighthouse_result
        .filter(|path| !path.as_os_str().is_empty())
        .ok_or("lighthouse result path is required (--lighthouse-result or LIGHTHOUSE_RESULT_PATH)")?;

    let project = match non_blank(cli.project) {
        Some(project) => project,
        None => default_project_name(&cli.repo_dir)?,
    };

    let mode = if cli.dry_run {
        Mode::DryRun
    } else {
        let spreadsheet_id = non_blank(cli.spreadsheet_id)
            .ok_or("spreadsheet id is required (--spreadsheet-id or SPREADSHEET_ID)")?;
        let sheet_name = non_blank(cli.sheet_name)
            .ok_or("sheet name is required (--sheet-name or SHEET_NAME)")?;
        Mode::Publish(PublishSettings {
            target: SheetTarget::new(spreadsheet_id, sheet_name),
            credentials: credentials_path(cli.credentials)?,
            sheets_api_url: cli.sheets_api_url,
        })
    };

    Ok(Settings {
        report_path,
        repo_dir: cli.repo_dir,
        project,
        mode,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn default_project_name(repo_dir: &Path) -> CliResult<String> {
    let resolved = std::fs::canonicalize(repo_dir)
        .map_err(|err| format!("failed to resolve {}: {err}", repo_dir.display()))?;
    resolved
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            format!(
                "cannot derive a project name from {}; pass --project",
                resolved.display()
            )
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{EnvGuard, env_lock, unique_dir_name};

    const KEYS: [&str; 7] = [
        "LIGHTHOUSE_RESULT_PATH",
        "SPREADSHEET_ID",
        "SHEET_NAME",
        "PROJECT_NAME",
        "REPO_DIR",
        "GOOGLE_APPLICATION_CREDENTIALS",
        "SHEETS_API_URL",
    ];

    fn clear_env() -> Vec<EnvGuard> {
        KEYS.into_iter().map(|key| EnvGuard::set(key, None)).collect()
    }

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["lighthouse-sheet"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("parse args")
    }

    fn publish_settings(settings: &Settings) -> &PublishSettings {
        match &settings.mode {
            Mode::Publish(publish) => publish,
            Mode::DryRun => panic!("expected publish mode"),
        }
    }

    #[test]
    fn flags_override_environment() {
        let _lock = env_lock();
        let _env = clear_env();
        let _report = EnvGuard::set("LIGHTHOUSE_RESULT_PATH", Some("/tmp/env-report.json"));
        let _id = EnvGuard::set("SPREADSHEET_ID", Some("env-sheet-id"));
        let _name = EnvGuard::set("SHEET_NAME", Some("EnvSheet"));

        let settings = resolve(parse(&[
            "--sheet-name",
            "FlagSheet",
            "--project",
            "demo",
            "--credentials",
            "/etc/perf/sa.json",
        ]))
        .expect("resolve");

        assert_eq!(settings.report_path, PathBuf::from("/tmp/env-report.json"));
        assert_eq!(settings.project, "demo");
        let publish = publish_settings(&settings);
        assert_eq!(publish.target, SheetTarget::new("env-sheet-id", "FlagSheet"));
        assert_eq!(publish.credentials, PathBuf::from("/etc/perf/sa.json"));
        assert_eq!(publish.sheets_api_url, DEFAULT_SHEETS_API_URL);
    }

    #[test]
    fn missing_report_path_is_rejected() {
        let _lock = env_lock();
        let _env = clear_env();

        let err = resolve(parse(&["--dry-run", "--project", "demo"])).unwrap_err();
        assert!(err.to_string().contains("lighthouse result path is required"));
    }

    #[test]
    fn blank_spreadsheet_id_counts_as_missing() {
        let _lock = env_lock();
        let _env = clear_env();
        let _id = EnvGuard::set("SPREADSHEET_ID", Some("   "));

        let err = resolve(parse(&[
            "--lighthouse-result",
            "report.json",
            "--sheet-name",
            "Runs",
            "--project",
            "demo",
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("spreadsheet id is required"));
    }

    #[test]
    fn missing_sheet_name_is_rejected() {
        let _lock = env_lock();
        let _env = clear_env();

        let err = resolve(parse(&[
            "--lighthouse-result",
            "report.json",
            "--spreadsheet-id",
            "sheet-123",
            "--project",
            "demo",
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("sheet name is required"));
    }

    #[test]
    fn dry_run_needs_no_sheet_settings() {
        let _lock = env_lock();
        let _env = clear_env();

        let settings = resolve(parse(&[
            "--lighthouse-result",
            "report.json",
            "--project",
            "demo",
            "--dry-run",
        ]))
        .expect("resolve");
        assert_eq!(settings.mode, Mode::DryRun);
        assert_eq!(settings.repo_dir, PathBuf::from("."));
    }

    #[test]
    fn project_defaults_to_repo_dir_name() {
        let _lock = env_lock();
        let _env = clear_env();
        let root = std::env::temp_dir().join(unique_dir_name());
        let repo = root.join("perf-site");
        std::fs::create_dir_all(&repo).expect("create repo dir");
        let _repo_dir = EnvGuard::set("REPO_DIR", repo.to_str());

        let settings = resolve(parse(&["--lighthouse-result", "report.json", "--dry-run"]))
            .expect("resolve");
        assert_eq!(settings.project, "perf-site");
        assert_eq!(settings.repo_dir, repo);

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[test]
    fn missing_repo_dir_without_project_fails() {
        let _lock = env_lock();
        let _env = clear_env();
        let missing = std::env::temp_dir().join(unique_dir_name());

        let err = resolve(parse(&[
            "--lighthouse-result",
            "report.json",
            "--dry-run",
            "--repo-dir",
            missing.to_str().expect("utf-8 path"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("failed to resolve"));
    }

    #[test]
    fn credentials_default_under_home() {
        let _lock = env_lock();
        let _env = clear_env();
        let _home = EnvGuard::set("HOME", Some("/tmp/perf-home"));
        let _api = EnvGuard::set("SHEETS_API_URL", Some("http://127.0.0.1:8080"));

        let settings = resolve(parse(&[
            "--lighthouse-result",
            "report.json",
            "--spreadsheet-id",
            "sheet-123",
            "--sheet-name",
            "Runs",
            "--project",
            "demo",
        ]))
        .expect("resolve");
        let publish = publish_settings(&settings);
        assert_eq!(
            publish.credentials,
            PathBuf::from("/tmp/perf-home/.lighthouse-to-spreadsheet/service-account.json")
        );
        assert_eq!(publish.sheets_api_url, "http://127.0.0.1:8080");
    }
}
