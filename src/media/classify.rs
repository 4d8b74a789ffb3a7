use super::OCTET_STREAM;
use std::path::Path;
use tracing::debug;

/// Answers "what kind of file is this" with a "<major>/<minor>" string.
///
/// Must never return an empty string; the catalog still guards against it.
pub trait Classifier {
    fn classify(&self, path: &Path) -> String;
}

impl<F> Classifier for F
where
    F: Fn(&Path) -> String,
{
    fn classify(&self, path: &Path) -> String {
        self(path)
    }
}

/// Extension lookup first, magic-byte sniffing when the extension
/// is unknown or only claims text.
#[derive(Debug, Clone, Default)]
pub struct SniffClassifier;

impl SniffClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn guess_from_extension(path: &Path) -> Option<&'static str> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        let mime = match ext.as_str() {
            // audio
            "mp3" => "audio/mpeg",
            "flac" => "audio/flac",
            "ogg" | "oga" => "audio/ogg",
            "opus" => "audio/opus",
            "m4a" => "audio/mp4",
            "aac" => "audio/aac",
            "wav" => "audio/x-wav",
            "wma" => "audio/x-ms-wma",
            "mka" => "audio/x-matroska",
            // video
            "mp4" | "m4v" => "video/mp4",
            "mkv" => "video/x-matroska",
            "webm" => "video/webm",
            "avi" => "video/x-msvideo",
            "mov" => "video/quicktime",
            "mpg" | "mpeg" => "video/mpeg",
            "wmv" => "video/x-ms-wmv",
            "flv" => "video/x-flv",
            "ts" => "video/mp2t",
            "3gp" => "video/3gpp",
            // image
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "bmp" => "image/bmp",
            "tif" | "tiff" => "image/tiff",
            // everything we want to keep out
            "json" => "application/json",
            "pdf" => "application/pdf",
            "srt" => "application/x-subrip",
            "m3u" | "m3u8" => "application/vnd.apple.mpegurl",
            "txt" | "nfo" | "log" => "text/plain",
            "md" => "text/markdown",
            "html" | "htm" => "text/html",
            "csv" => "text/csv",
            _ => return None,
        };
        Some(mime)
    }

    #[cfg(feature = "sniff")]
    fn sniff(path: &Path) -> Option<String> {
        match infer::get_from_path(path) {
            Ok(found) => found.map(|kind| kind.mime_type().to_string()),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "content sniffing failed");
                None
            }
        }
    }

    #[cfg(not(feature = "sniff"))]
    fn sniff(_path: &Path) -> Option<String> {
        None
    }
}

impl Classifier for SniffClassifier {
    fn classify(&self, path: &Path) -> String {
        let guessed = Self::guess_from_extension(path);

        let needs_sniff = guessed.map_or(true, |mime| mime.starts_with("text/"));
        if needs_sniff {
            if let Some(sniffed) = Self::sniff(path) {
                debug!(path = %path.display(), mime = %sniffed, "classified by content");
                return sniffed;
            }
        }

        guessed.unwrap_or(OCTET_STREAM).to_string()
    }
}
