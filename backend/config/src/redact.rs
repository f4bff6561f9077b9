//! Config redaction: produce safe-to-share config snapshots by masking
//! session material.

use crate::schema::PacerConfig;

/// Copy of `config` with the raw cookie and every cookie value masked.
///
/// The result is safe to log or print.
pub fn redact(config: &PacerConfig) -> PacerConfig {
    let mut redacted = config.clone();
    if let Some(client) = &mut redacted.client {
        if let Some(cookie) = &client.cookie {
            client.cookie = Some(mask(cookie));
        }
        for value in client.cookies.values_mut() {
            *value = mask(value);
        }
    }
    redacted
}

/// Keep a short prefix as a hint of which value is configured.
fn mask(secret: &str) -> String {
    if secret.chars().count() > 8 {
        format!("{}***", secret.chars().take(4).collect::<String>())
    } else {
        "***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ClientConfig;

    #[test]
    fn masks_cookie_material() {
        let mut client = ClientConfig {
            cookie: Some("ASP.NET_SessionId=abcdef123456".into()),
            base_url: Some("http://example.com".into()),
            ..Default::default()
        };
        client.cookies.insert("uid".into(), "1234567890".into());
        client.cookies.insert("short".into(), "xy".into());
        let cfg = PacerConfig {
            client: Some(client),
            ..Default::default()
        };

        let redacted = redact(&cfg).client.unwrap();
        assert_eq!(redacted.cookie.as_deref(), Some("ASP.***"));
        assert_eq!(redacted.cookies["uid"], "1234***");
        assert_eq!(redacted.cookies["short"], "***");
        assert_eq!(redacted.base_url.as_deref(), Some("http://example.com"));
    }

    #[test]
    fn config_without_client_is_unchanged() {
        let cfg = PacerConfig::default();
        assert_eq!(redact(&cfg), cfg);
    }
}
