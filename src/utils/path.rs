// src/utils/path.rs: host <-> WSL path conversion
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DRIVE_PREFIX: Regex = Regex::new(r"^([A-Za-z]):(.*)$").unwrap();
}

/// Converts a Windows path like `C:\Users\neel\file.fastq.gz` into the
/// WSL mount path `/mnt/c/Users/neel/file.fastq.gz`. Works for any drive letter.
///
/// Paths without a drive letter only have their backslashes turned into
/// forward slashes, so POSIX paths come back unchanged.
///
/// # Arguments
///
/// * `path` - Host path, absolute or relative.
///
/// # Returns
/// String path usable inside the Linux subsystem.
pub fn translate(path: &str) -> String {
    match DRIVE_PREFIX.captures(path) {
        Some(caps) => {
            let drive = caps[1].to_ascii_lowercase();
            let mut wsl = format!("/mnt/{}", drive);
            for part in caps[2].split(['\\', '/']).filter(|p| !p.is_empty()) {
                wsl.push('/');
                wsl.push_str(part);
            }
            wsl
        }
        None => path.replace('\\', "/"),
    }
}

/// Joins WSL path segments with forward slashes regardless of host OS.
pub fn posix_join(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else if base.ends_with('/') {
        format!("{}{}", base, name)
    } else {
        format!("{}/{}", base, name)
    }
}

/// Final segment of a path written with either separator.
pub fn file_name(path: &str) -> &str {
    path.rsplit(['\\', '/']).next().unwrap_or(path)
}
