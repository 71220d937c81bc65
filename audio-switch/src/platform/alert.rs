//! User-facing error alert.
//!
//! Used only when the tray cannot be brought up; everything else is logged.

/// Build the AppleScript that shows `message` in a critical alert.
pub fn alert_script(title: &str, message: &str) -> String {
    fn quote(text: &str) -> String {
        text.replace('\\', "\\\\").replace('"', "\\\"")
    }

    format!(
        "display alert \"{}\" message \"{}\" as critical",
        quote(title),
        quote(message)
    )
}

/// Show an error alert and log it.
pub fn show_error(title: &str, message: &str) {
    tracing::error!("{}: {}", title, message);

    #[cfg(target_os = "macos")]
    {
        let result = std::process::Command::new("osascript")
            .arg("-e")
            .arg(alert_script(title, message))
            .status();
        if let Err(e) = result {
            tracing::warn!("Failed to show alert: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_escapes_quotes_and_backslashes() {
        let script = alert_script("Audio Switch", r#"bad "value" at C:\path"#);
        assert_eq!(
            script,
            r#"display alert "Audio Switch" message "bad \"value\" at C:\\path" as critical"#
        );
    }
}
