pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::Settings;

use crate::error::AppResult;

pub fn load_settings(paths: &AppPaths, profile: &str) -> AppResult<Settings> {
    let mut settings = settings::load(paths.settings_file(profile))?;
    settings.apply_env();
    Ok(settings)
}

pub fn save_settings(paths: &AppPaths, profile: &str, settings: &Settings) -> AppResult<()> {
    settings::save(paths.settings_file(profile), settings)
}

/// Profile names end up in file names; keep them to one path component.
pub fn resolve_profile(requested: &str) -> String {
    let cleaned = requested
        .trim()
        .chars()
        .map(|ch| if matches!(ch, '/' | '\\' | ':') { '_' } else { ch })
        .collect::<String>();

    if cleaned.is_empty() || cleaned.chars().all(|ch| ch == '.') {
        return "default".to_string();
    }

    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_profile_is_default() {
        assert_eq!(resolve_profile("  "), "default");
        assert_eq!(resolve_profile(".."), "default");
    }

    #[test]
    fn profile_cannot_escape_config_dir() {
        assert_eq!(resolve_profile("../work"), ".._work");
        assert_eq!(resolve_profile(" personal "), "personal");
    }
}
