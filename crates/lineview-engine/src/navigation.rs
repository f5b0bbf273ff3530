//! Navigation targets reachable from the execution events table.

use std::process::{Command, Stdio};

use reqwest::Url;
use tracing::info;

/// Path of the lineage overview page, relative to the UI root.
pub const LINEAGE_OVERVIEW_PATH: &str = "app/lineage-overview/";

/// A page the dashboard can send the user to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationTarget {
    /// Lineage overview of one data source as written by one application.
    LineageOverview {
        datasource: String,
        application_id: String,
    },
}

impl NavigationTarget {
    pub fn lineage_overview(
        datasource: impl Into<String>,
        application_id: impl Into<String>,
    ) -> Self {
        Self::LineageOverview {
            datasource: datasource.into(),
            application_id: application_id.into(),
        }
    }

    /// Resolve against the UI root URL `base`.
    ///
    /// Query values are form-encoded, so data source URIs survive intact.
    pub fn resolve(&self, base: &str) -> Result<Url, NavigationError> {
        let mut url = Url::parse(base).map_err(|e| NavigationError::InvalidBase {
            base: base.to_string(),
            reason: e.to_string(),
        })?;
        if url.cannot_be_a_base() {
            return Err(NavigationError::InvalidBase {
                base: base.to_string(),
                reason: "not a hierarchical URL".into(),
            });
        }

        match self {
            Self::LineageOverview {
                datasource,
                application_id,
            } => {
                let path = format!("{}/{LINEAGE_OVERVIEW_PATH}", url.path().trim_end_matches('/'));
                url.set_path(&path);
                url.set_query(None);
                url.set_fragment(None);
                url.query_pairs_mut()
                    .append_pair("path", datasource)
                    .append_pair("applicationId", application_id);
            }
        }
        Ok(url)
    }
}

/// Something that can take the user to a URL.
pub trait Navigator: Send {
    fn navigate(&mut self, url: &Url) -> Result<(), NavigationError>;
}

/// Opens URLs by running an external command (`xdg-open`, `open`, ...).
///
/// Each call waits for the opener to exit, so it should hand the URL off
/// and return.
#[derive(Debug, Clone)]
pub struct CommandNavigator {
    argv: Vec<String>,
}

impl CommandNavigator {
    /// `argv` is the opener and its leading arguments; the URL is appended.
    pub fn new(argv: Vec<String>) -> Result<Self, NavigationError> {
        let has_program = argv.first().is_some_and(|program| !program.trim().is_empty());
        if !has_program {
            return Err(NavigationError::NoOpener);
        }
        Ok(Self { argv })
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

impl Navigator for CommandNavigator {
    fn navigate(&mut self, url: &Url) -> Result<(), NavigationError> {
        let (program, args) = self.argv.split_first().ok_or(NavigationError::NoOpener)?;
        info!(%url, opener = %program, "opening lineage overview");
        let status = Command::new(program)
            .args(args)
            .arg(url.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| NavigationError::Spawn {
                program: program.clone(),
                source,
            })?;
        if !status.success() {
            return Err(NavigationError::OpenerFailed {
                program: program.clone(),
                status,
            });
        }
        Ok(())
    }
}

/// Records visited URLs without leaving the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryNavigator {
    visited: Vec<Url>,
}

impl MemoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self) -> &[Url] {
        &self.visited
    }

    pub fn last(&self) -> Option<&Url> {
        self.visited.last()
    }
}

impl Navigator for MemoryNavigator {
    fn navigate(&mut self, url: &Url) -> Result<(), NavigationError> {
        info!(%url, "recorded navigation");
        self.visited.push(url.clone());
        Ok(())
    }
}

/// Errors that can occur while navigating.
#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    #[error("invalid UI base URL `{base}`: {reason}")]
    InvalidBase { base: String, reason: String },

    #[error("no opener command configured")]
    NoOpener,

    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}")]
    OpenerFailed {
        program: String,
        status: std::process::ExitStatus,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> NavigationTarget {
        NavigationTarget::lineage_overview(
            "hdfs://warehouse/marketing/raw.parquet",
            "app-20240102-0001",
        )
    }

    #[test]
    fn test_resolve_encodes_query_values() {
        let url = target().resolve("http://localhost:9090").unwrap();
        insta::assert_snapshot!(url.as_str(), @"http://localhost:9090/app/lineage-overview/?path=hdfs%3A%2F%2Fwarehouse%2Fmarketing%2Fraw.parquet&applicationId=app-20240102-0001");
    }

    #[test]
    fn test_resolve_keeps_base_path() {
        let url = target().resolve("https://lineage.example.com/ui/?stale=1").unwrap();
        assert_eq!(url.path(), "/ui/app/lineage-overview/");

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("path".into(), "hdfs://warehouse/marketing/raw.parquet".into()),
                ("applicationId".into(), "app-20240102-0001".into()),
            ]
        );
    }

    #[test]
    fn test_resolve_rejects_bad_base() {
        assert!(matches!(
            target().resolve("not a url"),
            Err(NavigationError::InvalidBase { .. })
        ));
        assert!(matches!(
            target().resolve("mailto:someone@example.com"),
            Err(NavigationError::InvalidBase { .. })
        ));
    }

    #[test]
    fn test_memory_navigator_records() {
        let mut navigator = MemoryNavigator::new();
        let url = target().resolve("http://localhost:9090").unwrap();

        navigator.navigate(&url).unwrap();

        assert_eq!(navigator.visited().len(), 1);
        assert_eq!(navigator.last(), Some(&url));
    }

    #[test]
    fn test_command_navigator_requires_program() {
        assert!(matches!(
            CommandNavigator::new(Vec::new()),
            Err(NavigationError::NoOpener)
        ));
        assert!(matches!(
            CommandNavigator::new(vec![" ".into()]),
            Err(NavigationError::NoOpener)
        ));
        let opener = CommandNavigator::new(vec!["xdg-open".into()]).unwrap();
        assert_eq!(opener.argv(), ["xdg-open".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_navigator_waits_for_opener() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("opened.txt");
        let script = format!("echo \"$0\" >> {}", log.display());
        let mut navigator =
            CommandNavigator::new(vec!["sh".into(), "-c".into(), script]).unwrap();
        let url = target().resolve("http://localhost:9090").unwrap();

        for _ in 0..3 {
            navigator.navigate(&url).unwrap();
        }

        // Every opener has exited by the time navigate returns
        let opened = std::fs::read_to_string(&log).unwrap();
        assert_eq!(opened.lines().count(), 3);
        assert!(opened.lines().all(|line| line == url.as_str()));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_navigator_reports_failed_opener() {
        let mut navigator = CommandNavigator::new(vec!["false".into()]).unwrap();
        let url = target().resolve("http://localhost:9090").unwrap();

        let err = navigator.navigate(&url).unwrap_err();

        assert!(matches!(
            err,
            NavigationError::OpenerFailed { ref program, .. } if program == "false"
        ));
    }

    #[test]
    fn test_command_navigator_reports_missing_program() {
        let mut navigator =
            CommandNavigator::new(vec!["lineview-no-such-opener".into()]).unwrap();
        let url = target().resolve("http://localhost:9090").unwrap();

        assert!(matches!(
            navigator.navigate(&url),
            Err(NavigationError::Spawn { .. })
        ));
    }
}
