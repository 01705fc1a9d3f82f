// src/scanner.rs
//
// =============================================================================
// RENDER-MANAGER: OUTPUT SCANNER (v 0.1)
// =============================================================================
//
// Derives "frames completed" by counting image files in a render directory.
// Best-effort throughout: any filesystem error is logged and folds into a
// frame count of 0 rather than propagating, because progress reporting must
// never take down the job.

use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &["png", "exr", "jpg", "jpeg", "tiff", "bmp"];

/// Resolves the render directory for an `output_path` per the plug-in's
/// naming convention. This heuristic is quirky (a ".blend" path containing
/// "render" resolves to `<dirname>/render`, not the file itself) and is
/// intentional; see spec §4.5 and §9 — do not generalize it.
pub fn resolve_render_dir(output_path: &str) -> Option<PathBuf> {
    if output_path.is_empty() {
        return None;
    }

    let path = Path::new(output_path);
    let lower = output_path.to_lowercase();

    if lower.contains("render") {
        if lower.ends_with(".blend") {
            let parent = path.parent().unwrap_or(Path::new(""));
            Some(parent.join("render"))
        } else if path.is_dir() {
            Some(path.to_path_buf())
        } else {
            Some(path.parent().unwrap_or(Path::new("")).to_path_buf())
        }
    } else {
        let parent = path.parent().unwrap_or(Path::new(""));
        Some(parent.join("render"))
    }
}

fn has_image_extension(filename: &str) -> bool {
    match Path::new(filename).extension().and_then(|e| e.to_str()) {
        Some(ext) => IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()),
        None => false,
    }
}

/// Counts image files directly inside `dir`. Missing directory or any read
/// error returns 0 and logs at the call site's discretion — this function
/// itself stays silent so callers can decide the right log level/context.
pub fn count_frames(dir: &Path) -> i64 {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .map(has_image_extension)
                    .unwrap_or(false)
            })
            .count() as i64,
        Err(_) => 0,
    }
}

/// Lists image filenames directly inside `dir`, sorted, for the preview
/// endpoints. Missing directory returns an empty list.
pub fn list_frame_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|n| has_image_extension(n))
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn empty_output_path_has_no_render_dir() {
        assert_eq!(resolve_render_dir(""), None);
    }

    #[test]
    fn blend_file_with_render_in_path_resolves_to_sibling_render_dir() {
        let got = resolve_render_dir("/scenes/render/a.blend").unwrap();
        assert_eq!(got, PathBuf::from("/scenes/render/render"));
    }

    #[test]
    fn path_without_render_substring_appends_render_to_parent() {
        let got = resolve_render_dir("/scenes/output/a.blend").unwrap();
        assert_eq!(got, PathBuf::from("/scenes/output/render"));
    }

    #[test]
    fn missing_directory_counts_zero_frames() {
        let dir = PathBuf::from("/does/not/exist/at/all");
        assert_eq!(count_frames(&dir), 0);
    }

    #[test]
    fn counts_only_allow_listed_extensions() {
        let tmp = TempDir::new().unwrap();
        for name in ["a.png", "b.EXR", "c.txt", "d.jpeg", "readme.md"] {
            fs::write(tmp.path().join(name), b"x").unwrap();
        }
        assert_eq!(count_frames(tmp.path()), 3);
    }

    #[test]
    fn list_frame_files_is_sorted_and_filtered() {
        let tmp = TempDir::new().unwrap();
        for name in ["f003.png", "f001.png", "notes.txt", "f002.PNG"] {
            fs::write(tmp.path().join(name), b"x").unwrap();
        }
        assert_eq!(
            list_frame_files(tmp.path()),
            vec!["f001.png", "f002.PNG", "f003.png"]
        );
    }
}
