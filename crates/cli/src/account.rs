use std::path::Path;

use inquire::{Password, PasswordDisplayMode, Text};

use agon::prelude::*;

/// Loads credentials from the account file, falling back to interactive
/// prompts when the file is missing or prompting is forced.
pub fn load_credentials(path: &Path, force_prompt: bool) -> Result<Credentials> {
    if !force_prompt
        && let Ok(raw) = std::fs::read_to_string(path)
    {
        return serde_json::from_str(&raw).map_err(|err| {
            AgonError::Message(format!("invalid account file {}: {err}", path.display()))
        });
    }

    prompt_credentials()
}

fn prompt_credentials() -> Result<Credentials> {
    let email = Text::new("email:")
        .with_help_message("AG-ON Premium account email")
        .prompt()
        .map_err(|err| AgonError::Message(format!("failed to read email: {err}")))?;

    let password = Password::new("password:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .map_err(|err| AgonError::Message(format!("failed to read password: {err}")))?;

    Ok(Credentials { email, password })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_the_account_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("account.json");
        std::fs::write(
            &path,
            r#"{"email":"listener@example.com","password":"hunter2"}"#,
        )
        .expect("write account file");

        let credentials = load_credentials(&path, false).expect("account file should load");
        assert_eq!(credentials.email, "listener@example.com");
        assert_eq!(credentials.password, "hunter2");
    }

    #[test]
    fn malformed_account_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("account.json");
        std::fs::write(&path, "{not json").expect("write account file");

        assert!(load_credentials(&path, false).is_err());
    }
}
