//! Output naming and destination key helpers.

use uuid::Uuid;

/// Keep only `[A-Za-z0-9._-]`; an empty result becomes `file`.
pub fn safe_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    // a name made only of dots would escape the scratch directory
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Default name for a merged output: `final_<8 hex>.mp4`.
pub fn default_output_name() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("final_{}.mp4", &id[..8])
}

/// Append `.ext` when `name` has no extension.
pub fn ensure_extension(name: &str, ext: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, suffix)) if !stem.is_empty() && !suffix.is_empty() => name.to_string(),
        _ => format!("{}.{}", name.trim_end_matches('.'), ext),
    }
}

/// Strip the extension from a file name.
pub fn file_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Bucket-relative path for `name` under `prefix`.
///
/// Leading slashes are stripped and a non-empty prefix always ends in `/`.
pub fn destination_path(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_start_matches('/');
    if prefix.is_empty() {
        name.to_string()
    } else if prefix.ends_with('/') {
        format!("{}{}", prefix, name)
    } else {
        format!("{}/{}", prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_name() {
        assert_eq!(safe_name("final video (1).mp4"), "finalvideo1.mp4");
        assert_eq!(safe_name("../../etc/passwd"), "....etcpasswd");
        assert_eq!(safe_name("clip_01-a.mp4"), "clip_01-a.mp4");
        assert_eq!(safe_name("///"), "file");
        assert_eq!(safe_name(".."), "file");
        assert_eq!(safe_name(""), "file");
    }

    #[test]
    fn test_default_output_name() {
        let name = default_output_name();
        assert!(name.starts_with("final_"));
        assert!(name.ends_with(".mp4"));
        assert_eq!(name.len(), "final_".len() + 8 + ".mp4".len());
    }

    #[test]
    fn test_ensure_extension() {
        assert_eq!(ensure_extension("out", "mp4"), "out.mp4");
        assert_eq!(ensure_extension("out.mov", "mp4"), "out.mov");
        assert_eq!(ensure_extension("out.", "mp4"), "out.mp4");
        assert_eq!(ensure_extension(".hidden", "mp4"), ".hidden.mp4");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("talk.mp4"), "talk");
        assert_eq!(file_stem("talk"), "talk");
        assert_eq!(file_stem("a.b.mp4"), "a.b");
    }

    #[test]
    fn test_destination_path() {
        assert_eq!(destination_path("VideosFinales/", "a.mp4"), "VideosFinales/a.mp4");
        assert_eq!(destination_path("/VideosFinales", "a.mp4"), "VideosFinales/a.mp4");
        assert_eq!(destination_path("", "a.mp4"), "a.mp4");
        assert_eq!(destination_path("/", "a.mp4"), "a.mp4");
        assert_eq!(destination_path("user42/clips/", "a_clip1.mp3"), "user42/clips/a_clip1.mp3");
    }
}
