use std::time::Duration;

use agon::prelude::*;

pub fn estimate_eta(downloaded: u64, total: u64, elapsed: Duration) -> Option<Duration> {
    if downloaded == 0 || total <= downloaded || elapsed.is_zero() {
        return None;
    }

    let speed = downloaded as f64 / elapsed.as_secs_f64();
    if speed <= 0.0 {
        return None;
    }

    let remaining = (total - downloaded) as f64 / speed;
    Some(Duration::from_secs_f64(remaining.max(0.0)))
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let mins = secs / 60;
    let rem = secs % 60;
    format!("{mins:02}:{rem:02}")
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0usize;

    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}

pub fn format_bytes_f64(bytes: f64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes;
    let mut unit = 0usize;

    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{value:.0} {}", UNITS[unit])
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}

/// Strips characters that would break or escape the output path.
pub fn sanitize_filename(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = cleaned.trim().trim_matches('.').to_string();
    if trimmed.is_empty() {
        "episode".to_string()
    } else {
        trimmed
    }
}

/// Output name scheme: `<title>.ep<episode_id>.<media_format>`.
pub fn output_file_name(info: &EpisodeInfo) -> String {
    format!(
        "{}.ep{}.{}",
        sanitize_filename(&info.title),
        info.episode_id,
        info.media_format
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> EpisodeInfo {
        EpisodeInfo {
            title: "テスト番組 第22回".to_string(),
            program_id: "21".to_string(),
            episode_id: "22".to_string(),
            media_format: "mp4".to_string(),
        }
    }

    #[test]
    fn output_name_follows_the_site_scheme() {
        assert_eq!(output_file_name(&info()), "テスト番組 第22回.ep22.mp4");
    }

    #[test]
    fn path_separators_are_stripped_from_titles() {
        assert_eq!(sanitize_filename("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize_filename("  .. "), "episode");
    }

    #[test]
    fn formats_bytes_with_binary_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn eta_needs_progress_and_elapsed_time() {
        assert_eq!(estimate_eta(0, 100, Duration::from_secs(1)), None);
        assert_eq!(estimate_eta(100, 100, Duration::from_secs(1)), None);
        let eta = estimate_eta(50, 100, Duration::from_secs(10)).expect("eta should exist");
        assert_eq!(eta.as_secs(), 10);
    }
}
