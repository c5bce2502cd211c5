//! The closed set of external tools the exporter shells out to.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::settings::keys;

/// One of the two external binaries md2doc export depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    /// Document converter (markdown → docx and friends).
    Pandoc,
    /// HTML-to-PDF renderer.
    WkHtmlToPdf,
}

impl ToolKind {
    /// Both tools, in the order the exporter needs them.
    pub fn all() -> &'static [ToolKind] {
        &[ToolKind::Pandoc, ToolKind::WkHtmlToPdf]
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ToolKind::Pandoc => "pandoc",
            ToolKind::WkHtmlToPdf => "wkhtmltopdf",
        }
    }

    /// Settings key a discovered path is saved under.
    pub fn settings_key(self) -> &'static str {
        match self {
            ToolKind::Pandoc => keys::PANDOC_PATH,
            ToolKind::WkHtmlToPdf => keys::WKHTMLTOPDF_PATH,
        }
    }

    /// Settings key resolving to the tool's download page, for the
    /// not-found message.
    pub fn download_url_key(self) -> &'static str {
        match self {
            ToolKind::Pandoc => keys::DOWNLOAD_URL,
            ToolKind::WkHtmlToPdf => "wkhtmltopdf_download_url",
        }
    }

    /// Environment variables that may point at the install, checked in
    /// order. A directory value names the install root.
    pub fn env_var_names(self) -> &'static [&'static str] {
        match self {
            ToolKind::Pandoc => &["PANDOC_HOME", "PANDOC_PATH", "PANDOC"],
            ToolKind::WkHtmlToPdf => &["WKHTMLTOPDF_HOME", "WKHTMLTOPDF_PATH", "WKHTMLTOPDF"],
        }
    }

    /// Platform executable file name.
    pub fn executable_name(self) -> &'static str {
        if cfg!(windows) {
            match self {
                ToolKind::Pandoc => "pandoc.exe",
                ToolKind::WkHtmlToPdf => "wkhtmltopdf.exe",
            }
        } else {
            self.display_name()
        }
    }

    /// The single argument that makes the tool report its version.
    /// Both tools happen to agree on the flag.
    pub fn version_arg(self) -> &'static str {
        "--version"
    }

    /// Conventional install locations for the current platform, probed in
    /// order after the saved path, environment hints and search path all
    /// miss.
    pub fn common_install_paths(self) -> Vec<PathBuf> {
        let exe = self.executable_name();
        if cfg!(target_os = "windows") {
            let vendor_dir: &[&str] = match self {
                ToolKind::Pandoc => &["Pandoc"],
                ToolKind::WkHtmlToPdf => &["wkhtmltopdf", "bin"],
            };
            let mut out = Vec::new();
            for root in ["ProgramFiles", "ProgramFiles(x86)"] {
                if let Some(programs) = std::env::var_os(root).map(PathBuf::from) {
                    let mut path = programs;
                    for part in vendor_dir {
                        path = path.join(part);
                    }
                    out.push(path.join(exe));
                }
            }
            if let Some(home) = dirs::home_dir() {
                out.push(home.join("scoop").join("shims").join(exe));
                out.push(home.join("bin").join(exe));
            }
            out
        } else if cfg!(target_os = "macos") {
            ["/usr/local/bin", "/opt/homebrew/bin", "/usr/bin"]
                .iter()
                .map(|dir| Path::new(dir).join(exe))
                .collect()
        } else {
            let mut out: Vec<PathBuf> = ["/usr/bin", "/usr/local/bin", "/snap/bin"]
                .iter()
                .map(|dir| Path::new(dir).join(exe))
                .collect();
            if let Some(home) = dirs::home_dir() {
                out.push(home.join(".local").join("bin").join(exe));
            }
            out
        }
    }
}

impl FromStr for ToolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pandoc" => Ok(ToolKind::Pandoc),
            "wkhtmltopdf" => Ok(ToolKind::WkHtmlToPdf),
            other => Err(format!(
                "unknown tool {other:?} (expected \"pandoc\" or \"wkhtmltopdf\")"
            )),
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!("pandoc".parse::<ToolKind>(), Ok(ToolKind::Pandoc));
        assert_eq!("WKHTMLTOPDF".parse::<ToolKind>(), Ok(ToolKind::WkHtmlToPdf));
        assert!("latex".parse::<ToolKind>().is_err());
    }

    #[test]
    fn test_env_var_names_per_tool() {
        for tool in ToolKind::all() {
            assert_eq!(tool.env_var_names().len(), 3);
            for name in tool.env_var_names() {
                assert!(name.starts_with(&tool.display_name().to_ascii_uppercase()));
            }
        }
    }

    #[test]
    fn test_common_install_paths_end_with_executable() {
        for tool in ToolKind::all() {
            let paths = tool.common_install_paths();
            assert!(!paths.is_empty());
            for path in paths {
                assert_eq!(
                    path.file_name().and_then(|n| n.to_str()),
                    Some(tool.executable_name())
                );
            }
        }
    }
}
