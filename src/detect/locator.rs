//! Multi-stage discovery of one external tool.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{DiscoveryError, SettingsError};
use crate::settings::{env, SettingsStore};

use super::probe::{self, DiscoveredExecutable};
use super::tool::ToolKind;

/// Finds a usable install of one external tool.
///
/// Stages run strictly in order and stop at the first hit: the saved
/// settings key, the tool's environment hints, the OS search path, then
/// conventional install locations. "Not found" is a normal outcome the
/// caller handles (typically by offering a manual file pick); only
/// cancellation is an error.
pub struct ToolLocator<'a> {
    tool: ToolKind,
    settings: &'a SettingsStore,
}

impl<'a> ToolLocator<'a> {
    pub fn new(tool: ToolKind, settings: &'a SettingsStore) -> Self {
        Self { tool, settings }
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    /// Walk the discovery stages. The caller supplies the deadline by
    /// cancelling the token; once it fires no further candidate is probed
    /// and any in-flight version query is killed.
    pub async fn discover(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<DiscoveredExecutable>, DiscoveryError> {
        // Stage 1: the path saved from an earlier discovery or manual pick.
        if let Some(saved) = self.settings.get(self.tool.settings_key()) {
            debug!(tool = %self.tool, %saved, "Trying saved path");
            if let Some(found) = self.try_candidate(&saved, cancel).await? {
                return Ok(Some(found));
            }
        }

        // Stage 2: environment hints. A directory value names the install
        // root; the probe joins the executable name itself.
        for name in self.tool.env_var_names() {
            if let Some(value) = env::lookup(name) {
                debug!(tool = %self.tool, name, %value, "Trying environment hint");
                if let Some(found) = self.try_candidate(&value, cancel).await? {
                    return Ok(Some(found));
                }
            }
        }

        // Stage 3: the bare name, resolved by the OS search path.
        if let Some(found) = self
            .try_candidate(self.tool.executable_name(), cancel)
            .await?
        {
            return Ok(Some(found));
        }

        // Stage 4: conventional install locations.
        for path in self.tool.common_install_paths() {
            if let Some(found) = self
                .try_candidate(&path.to_string_lossy(), cancel)
                .await?
            {
                return Ok(Some(found));
            }
        }

        debug!(tool = %self.tool, "No usable install found");
        Ok(None)
    }

    /// Save a discovered path under the tool's settings key. Callers invoke
    /// this explicitly after confirming with the user; discovery itself
    /// never persists anything.
    pub fn persist(&self, found: &DiscoveredExecutable) -> Result<(), SettingsError> {
        self.settings
            .set(self.tool.settings_key(), Some(&found.path.to_string_lossy()))
    }

    /// Download-page hint for this tool, resolved through the settings
    /// store so a configured value overrides the bundled default.
    pub fn download_hint(&self) -> Option<String> {
        self.settings.get(self.tool.download_url_key())
    }

    /// Probe one candidate, translating a fired token into `Cancelled`.
    /// The check runs before the probe as well, so discovery started with
    /// an already-expired deadline reports `Cancelled` rather than
    /// silently skipping every candidate into a bogus "not found".
    async fn try_candidate(
        &self,
        candidate: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<DiscoveredExecutable>, DiscoveryError> {
        if cancel.is_cancelled() {
            return Err(DiscoveryError::Cancelled);
        }
        let found = probe::validate(self.tool, candidate, cancel).await;
        if found.is_none() && cancel.is_cancelled() {
            return Err(DiscoveryError::Cancelled);
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_expired_deadline_is_cancelled_not_absent() {
        let dir = TempDir::new().unwrap();
        let settings = SettingsStore::open(dir.path().join("settings.toml"));
        let locator = ToolLocator::new(ToolKind::Pandoc, &settings);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = locator.discover(&cancel).await;
        assert!(matches!(result, Err(DiscoveryError::Cancelled)));
    }

    #[tokio::test]
    async fn test_download_hint_falls_back_to_bundled_resource() {
        let dir = TempDir::new().unwrap();
        let settings = SettingsStore::open(dir.path().join("settings.toml"));

        let pandoc = ToolLocator::new(ToolKind::Pandoc, &settings);
        assert_eq!(
            pandoc.download_hint().as_deref(),
            Some("https://pandoc.org/installing.html")
        );

        let wkhtml = ToolLocator::new(ToolKind::WkHtmlToPdf, &settings);
        assert_eq!(
            wkhtml.download_hint().as_deref(),
            Some("https://wkhtmltopdf.org/downloads.html")
        );
    }

    #[cfg(unix)]
    mod unix {
        use std::os::unix::fs::PermissionsExt;
        use std::path::{Path, PathBuf};

        use tempfile::TempDir;

        use super::super::*;

        fn fake_tool(dir: &Path, name: &str, version_line: &str) -> PathBuf {
            let path = dir.join(name);
            std::fs::write(&path, format!("#!/bin/sh\necho '{version_line}'\n")).unwrap();
            let mut perms = std::fs::metadata(&path).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&path, perms).unwrap();
            path
        }

        #[tokio::test]
        async fn test_saved_path_short_circuits() {
            let dir = TempDir::new().unwrap();
            let settings = SettingsStore::open(dir.path().join("settings.toml"));
            let tool = fake_tool(dir.path(), "pandoc", "pandoc 2.19.2");
            settings
                .set(ToolKind::Pandoc.settings_key(), Some(tool.to_str().unwrap()))
                .unwrap();

            let locator = ToolLocator::new(ToolKind::Pandoc, &settings);
            let cancel = CancellationToken::new();
            let found = locator
                .discover(&cancel)
                .await
                .unwrap()
                .expect("saved path validates");

            // Stage 1 wins: the result is exactly the saved path, not a
            // system install or search-path hit.
            assert_eq!(found.path, tool);
            assert_eq!(found.version, "pandoc 2.19.2");
        }

        #[tokio::test]
        async fn test_stale_saved_path_does_not_block_discovery() {
            let dir = TempDir::new().unwrap();
            let settings = SettingsStore::open(dir.path().join("settings.toml"));
            settings
                .set(
                    ToolKind::WkHtmlToPdf.settings_key(),
                    Some("/no/such/place/wkhtmltopdf"),
                )
                .unwrap();

            let locator = ToolLocator::new(ToolKind::WkHtmlToPdf, &settings);
            let cancel = CancellationToken::new();
            // The stale path is skipped and the remaining stages run; on a
            // machine without wkhtmltopdf this lands on Ok(None), and either
            // way it must not report an error.
            let result = locator.discover(&cancel).await;
            assert!(result.is_ok());
        }

        #[tokio::test]
        async fn test_persist_writes_settings_key() {
            let dir = TempDir::new().unwrap();
            let settings = SettingsStore::open(dir.path().join("settings.toml"));
            let tool = fake_tool(dir.path(), "pandoc", "pandoc 3.0");

            let locator = ToolLocator::new(ToolKind::Pandoc, &settings);
            let cancel = CancellationToken::new();
            let found = probe::validate(ToolKind::Pandoc, tool.to_str().unwrap(), &cancel)
                .await
                .expect("manual pick validates");

            // Nothing is saved until the caller asks.
            assert_eq!(settings.get(ToolKind::Pandoc.settings_key()), None);
            locator.persist(&found).unwrap();
            assert_eq!(
                settings.get(ToolKind::Pandoc.settings_key()).as_deref(),
                tool.to_str()
            );
        }
    }
}
