use std::path::PathBuf;

use dirs_next::home_dir;

/// Home-directory prefixes understood by [`expand_user_path`].
const HOME_PREFIXES: [&str; 3] = ["~", "$HOME", "%USERPROFILE%"];

/// Expands a leading `~`, `$HOME` or `%USERPROFILE%` to the user's home directory.
///
/// Paths without one of those prefixes, and paths where the home directory
/// cannot be determined, are returned unchanged.
pub fn expand_user_path(path: &str) -> PathBuf {
    let trimmed = path.trim();
    for prefix in HOME_PREFIXES {
        let Some(rest) = trimmed.strip_prefix(prefix) else {
            continue;
        };
        if !(rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\')) {
            continue;
        }
        let Some(home) = home_dir() else {
            return PathBuf::from(trimmed);
        };
        let rest = rest.trim_start_matches(['/', '\\']);
        return if rest.is_empty() { home } else { home.join(rest) };
    }
    PathBuf::from(trimmed)
}
