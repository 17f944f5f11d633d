use chrono::{DateTime, Utc};
use serde::Serialize;

use super::validation::extension_of;

/// Coarse type of a stored file, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Web,
    Vector,
    Image,
    Markdown,
    Text,
    Other,
}

impl FileCategory {
    pub fn from_extension(extension: &str) -> Self {
        match extension {
            "html" => FileCategory::Web,
            "svg" => FileCategory::Vector,
            "jpg" | "jpeg" | "png" | "gif" | "webp" => FileCategory::Image,
            "md" => FileCategory::Markdown,
            "txt" => FileCategory::Text,
            _ => FileCategory::Other,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            FileCategory::Web => "\u{1F310}",
            FileCategory::Vector => "\u{1F3A8}",
            FileCategory::Image => "\u{1F5BC}\u{FE0F}",
            FileCategory::Markdown => "\u{1F4DD}",
            FileCategory::Text => "\u{1F4C4}",
            FileCategory::Other => "\u{1F4C1}",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FileCategory::Web => "HTML page",
            FileCategory::Vector => "SVG drawing",
            FileCategory::Image => "Image",
            FileCategory::Markdown => "Markdown",
            FileCategory::Text => "Text",
            FileCategory::Other => "File",
        }
    }
}

/// One regular file directly inside the content root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    pub name: String,
    pub size_bytes: u64,
    pub modified_at: DateTime<Utc>,
    pub extension: String,
    pub category: FileCategory,
}

impl StoredFile {
    pub fn new(name: String, size_bytes: u64, modified_at: DateTime<Utc>) -> Self {
        let extension = extension_of(&name);
        let category = FileCategory::from_extension(&extension);

        Self {
            name,
            size_bytes,
            modified_at,
            extension,
            category,
        }
    }

    pub fn formatted_size(&self) -> String {
        format_file_size(self.size_bytes)
    }
}

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// `"512 bytes"`, `"1.50 KB"`, `"2.00 MB"`, `"1.00 GB"`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
