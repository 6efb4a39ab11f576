//! Fixture archives shaped like a real account export.

use std::fs;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;

pub const EXPORT_DIR: &str = "connections/followers_and_following";

/// Writes a zip archive at `path`. Names ending in `/` become directories.
pub fn build_zip<P: AsRef<Path>>(path: P, entries: &[(String, String)]) {
    let file = fs::File::create(path.as_ref()).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    for (name, content) in entries {
        if name.ends_with('/') {
            writer
                .add_directory(name.as_str(), SimpleFileOptions::default())
                .unwrap();
        } else {
            writer
                .start_file(name.as_str(), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
    }
    writer.finish().unwrap();
}

/// Minimal list page the way the platform renders it.
pub fn profile_list_markup(domain: &str, handles: &[&str]) -> String {
    let links: String = handles
        .iter()
        .map(|h| {
            format!(
                "<div><a target=\"_blank\" href=\"https://www.{}/{}/\">{}</a></div>\n",
                domain, h, h
            )
        })
        .collect();
    format!("<html><body>{}</body></html>", links)
}

pub fn export_entries(following: &[&str], followers: &[&str]) -> Vec<(String, String)> {
    vec![
        (format!("{}/", EXPORT_DIR), String::new()),
        (
            format!("{}/following.html", EXPORT_DIR),
            profile_list_markup("instagram.com", following),
        ),
        (
            format!("{}/followers_1.html", EXPORT_DIR),
            profile_list_markup("instagram.com", followers),
        ),
    ]
}

pub fn write_export_zip<P: AsRef<Path>>(path: P, following: &[&str], followers: &[&str]) {
    build_zip(path, &export_entries(following, followers));
}
