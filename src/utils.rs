use crate::error::DownloadError;

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

pub fn format_speed(bytes_per_sec: f64) -> String {
    format!("{}/s", format_bytes(bytes_per_sec as u64))
}

pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Last path segment of the URL, used when the server names no file.
pub fn file_name_from_url(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|segments| segments.last())
                .filter(|name| !name.is_empty())
                .map(|name| name.to_string())
        })
        .unwrap_or_else(|| "downloaded_file".to_string())
}

/// Extracts the `filename` parameter from a content-disposition value.
/// The header names the destination file, so a value without a usable
/// filename is an error rather than a fallback.
pub fn file_name_from_disposition(value: &str) -> Result<String, DownloadError> {
    for param in value.split(';').map(str::trim) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        if !key.trim().eq_ignore_ascii_case("filename") {
            continue;
        }
        let name = raw.trim().trim_matches('"').trim();
        if name.is_empty() {
            return Err(DownloadError::Parse(format!(
                "empty filename in content-disposition: {value}"
            )));
        }
        return Ok(name.to_string());
    }
    Err(DownloadError::Parse(format!(
        "no filename in content-disposition: {value}"
    )))
}
