// src/services/notify.rs

//! Digest delivery.
//!
//! The default backend posts to the Resend HTTP API; an SMTP relay is
//! available with the `smtp` feature.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::config::Credentials;
use crate::error::{AppError, Result};
use crate::models::{DeliveryConfig, DeliveryProvider};
use crate::utils::http::{create_client, snippet};

/// Delivers a rendered digest to one recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html: &str) -> Result<()>;
}

/// Build the notifier selected by `delivery.provider`.
pub fn build_notifier(
    config: &DeliveryConfig,
    credentials: &Credentials,
) -> Result<Box<dyn Notifier>> {
    match config.provider {
        DeliveryProvider::Resend => Ok(Box::new(ResendNotifier::new(
            config,
            &credentials.delivery_api_key,
        )?)),
        #[cfg(feature = "smtp")]
        DeliveryProvider::Smtp => Ok(Box::new(smtp::SmtpNotifier::new(
            config,
            &credentials.delivery_api_key,
        )?)),
        #[cfg(not(feature = "smtp"))]
        DeliveryProvider::Smtp => Err(AppError::config(
            "delivery.provider = \"smtp\" requires the `smtp` feature",
        )),
    }
}

#[derive(Debug, Serialize)]
struct EmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

/// Resend API backend.
pub struct ResendNotifier {
    from: String,
    base_url: String,
    api_key: String,
    client: Client,
}

impl ResendNotifier {
    pub fn new(config: &DeliveryConfig, api_key: impl Into<String>) -> Result<Self> {
        let user_agent = concat!("jobwatch/", env!("CARGO_PKG_VERSION"));
        let client = create_client(user_agent, config.timeout_secs)?;
        Ok(Self {
            from: config.from.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }
}

#[async_trait]
impl Notifier for ResendNotifier {
    async fn send(&self, recipient: &str, subject: &str, html: &str) -> Result<()> {
        let request = EmailRequest {
            from: &self.from,
            to: [recipient],
            subject,
            html,
        };

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::delivery(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::delivery(format!(
                "provider returned {}: {}",
                status,
                snippet(&body)
            )));
        }

        log::info!("Email sent to {}", recipient);
        Ok(())
    }
}

#[cfg(feature = "smtp")]
mod smtp {
    use async_trait::async_trait;
    use lettre::message::{Mailbox, header::ContentType};
    use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
    use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

    use super::Notifier;
    use crate::error::{AppError, Result};
    use crate::models::DeliveryConfig;

    /// SMTP relay backend (STARTTLS).
    pub struct SmtpNotifier {
        from: Mailbox,
        mailer: AsyncSmtpTransport<Tokio1Executor>,
    }

    impl SmtpNotifier {
        pub fn new(config: &DeliveryConfig, password: &str) -> Result<Self> {
            let from: Mailbox = config
                .from
                .parse()
                .map_err(|e| AppError::config(format!("Invalid delivery.from: {e}")))?;

            let username = if config.smtp.username.is_empty() {
                from.email.to_string()
            } else {
                config.smtp.username.clone()
            };

            let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp.host)
                .map_err(|e| AppError::config(format!("SMTP relay: {e}")))?
                .port(config.smtp.port)
                .credentials(SmtpCredentials::new(username, password.to_string()))
                .build();

            Ok(Self { from, mailer })
        }
    }

    #[async_trait]
    impl Notifier for SmtpNotifier {
        async fn send(&self, recipient: &str, subject: &str, html: &str) -> Result<()> {
            let to: Mailbox = recipient
                .parse()
                .map_err(|e| AppError::delivery(format!("Invalid recipient: {e}")))?;

            let email = Message::builder()
                .from(self.from.clone())
                .to(to)
                .subject(subject)
                .header(ContentType::TEXT_HTML)
                .body(html.to_string())
                .map_err(|e| AppError::delivery(format!("Build email: {e}")))?;

            self.mailer
                .send(email)
                .await
                .map_err(|e| AppError::delivery(format!("SMTP send: {e}")))?;

            log::info!("Email sent to {} via SMTP", recipient);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn config(base_url: &str) -> DeliveryConfig {
        DeliveryConfig {
            base_url: base_url.to_string(),
            ..DeliveryConfig::default()
        }
    }

    #[tokio::test]
    async fn test_resend_posts_email() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/emails")
            .match_header("authorization", "Bearer re_test")
            .match_body(Matcher::Json(serde_json::json!({
                "from": "Daily Jobs <onboarding@resend.dev>",
                "to": ["me@example.com"],
                "subject": "Jobs",
                "html": "<p>hi</p>"
            })))
            .with_status(200)
            .with_body(r#"{"id": "49a3999c-0ce1-4ea6-ab68-afcd6dc2e794"}"#)
            .create_async()
            .await;

        let notifier = ResendNotifier::new(&config(&server.url()), "re_test").unwrap();
        notifier
            .send("me@example.com", "Jobs", "<p>hi</p>")
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_resend_failure_is_delivery_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/emails")
            .with_status(422)
            .with_body(r#"{"name": "validation_error", "message": "Invalid `to` field."}"#)
            .create_async()
            .await;

        let notifier = ResendNotifier::new(&config(&server.url()), "re_test").unwrap();
        let err = notifier
            .send("me@example.com", "Jobs", "<p>hi</p>")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Delivery { ref message } if message.contains("422")));
    }

    #[test]
    fn test_build_notifier_resend() {
        let credentials = Credentials {
            search_api_key: "serp".into(),
            delivery_api_key: "re_test".into(),
            recipient: "me@example.com".into(),
        };
        assert!(build_notifier(&DeliveryConfig::default(), &credentials).is_ok());
    }

    #[cfg(not(feature = "smtp"))]
    #[test]
    fn test_build_notifier_smtp_requires_feature() {
        let credentials = Credentials {
            search_api_key: "serp".into(),
            delivery_api_key: "pw".into(),
            recipient: "me@example.com".into(),
        };
        let config = DeliveryConfig {
            provider: DeliveryProvider::Smtp,
            ..DeliveryConfig::default()
        };
        assert!(matches!(
            build_notifier(&config, &credentials),
            Err(AppError::Config(_))
        ));
    }
}
