//! Audio format hints derived from MIME types and file names.

pub const DEFAULT_FORMAT: &str = "wav";

/// Short container name for an upload, e.g. `audio/webm;codecs=opus` → `webm`.
///
/// Falls back to the file extension, then to `wav`.
pub fn format_hint(mime_type: Option<&str>, file_name: Option<&str>) -> String {
    mime_type
        .and_then(from_mime)
        .or_else(|| file_name.and_then(from_file_name))
        .unwrap_or_else(|| DEFAULT_FORMAT.to_string())
}

fn from_mime(mime_type: &str) -> Option<String> {
    let essence = mime_type.split(';').next()?.trim().to_ascii_lowercase();
    let (kind, subtype) = essence.split_once('/')?;
    if kind != "audio" && kind != "video" {
        return None;
    }
    normalize(subtype)
}

fn from_file_name(file_name: &str) -> Option<String> {
    let (_, extension) = file_name.rsplit_once('.')?;
    normalize(&extension.to_ascii_lowercase())
}

fn normalize(raw: &str) -> Option<String> {
    let raw = raw.strip_prefix("x-").unwrap_or(raw);
    let name = match raw {
        "wave" => "wav",
        "mpeg" => "mp3",
        other => other,
    };
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    valid.then(|| name.to_string())
}
