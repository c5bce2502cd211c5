//! Typed tier: the closed set of statically known settings slots.
//!
//! The original application discovered slots by reflecting over a generated
//! settings class; here the recognized names are a fixed enumeration.

use serde::{Deserialize, Serialize};

/// Settings keys with dedicated typed slots. All key matching in the store
/// is ASCII-case-insensitive.
pub mod keys {
    /// Saved path of the pandoc executable.
    pub const PANDOC_PATH: &str = "pandoc_path";
    /// Saved path of the wkhtmltopdf executable.
    pub const WKHTMLTOPDF_PATH: &str = "wkhtmltopdf_path";
    /// Folder exported documents are written to.
    pub const OUTPUT_DIR: &str = "output_dir";
    /// Download-page hint shown when pandoc is missing.
    pub const DOWNLOAD_URL: &str = "download_url";
}

/// One dedicated storage slot in the typed tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TypedSlot {
    PandocPath,
    WkhtmltopdfPath,
    OutputDir,
    DownloadUrl,
}

impl TypedSlot {
    pub(crate) fn all() -> &'static [TypedSlot] {
        &[
            TypedSlot::PandocPath,
            TypedSlot::WkhtmltopdfPath,
            TypedSlot::OutputDir,
            TypedSlot::DownloadUrl,
        ]
    }

    /// Canonical key for this slot.
    pub(crate) fn key(self) -> &'static str {
        match self {
            TypedSlot::PandocPath => keys::PANDOC_PATH,
            TypedSlot::WkhtmltopdfPath => keys::WKHTMLTOPDF_PATH,
            TypedSlot::OutputDir => keys::OUTPUT_DIR,
            TypedSlot::DownloadUrl => keys::DOWNLOAD_URL,
        }
    }

    /// Match a key against the closed slot set, case-insensitively.
    pub(crate) fn from_key(key: &str) -> Option<TypedSlot> {
        TypedSlot::all()
            .iter()
            .copied()
            .find(|slot| slot.key().eq_ignore_ascii_case(key))
    }
}

/// On-disk settings file. The named fields are the typed tier's dedicated
/// slots; `dynamic_settings` is the reserved slot holding the dynamic
/// tier's serialized blob.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct TypedSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pandoc_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wkhtmltopdf_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_settings: Option<String>,
}

impl TypedSettings {
    pub(crate) fn slot(&self, slot: TypedSlot) -> Option<&str> {
        match slot {
            TypedSlot::PandocPath => self.pandoc_path.as_deref(),
            TypedSlot::WkhtmltopdfPath => self.wkhtmltopdf_path.as_deref(),
            TypedSlot::OutputDir => self.output_dir.as_deref(),
            TypedSlot::DownloadUrl => self.download_url.as_deref(),
        }
    }

    pub(crate) fn slot_mut(&mut self, slot: TypedSlot) -> &mut Option<String> {
        match slot {
            TypedSlot::PandocPath => &mut self.pandoc_path,
            TypedSlot::WkhtmltopdfPath => &mut self.wkhtmltopdf_path,
            TypedSlot::OutputDir => &mut self.output_dir,
            TypedSlot::DownloadUrl => &mut self.download_url,
        }
    }
}
