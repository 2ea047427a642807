// Copyright (c) 2025 Tether Engineering. All rights reserved.
// SPDX-License-Identifier: MIT

//! SMTP mail transport for Tether.
//!
//! Sends the one-time welcome mail (and any future operational mail) as a
//! multipart HTML + plain text message with To and Cc recipient lists. The
//! transport is an optional subsystem: [`SmtpConfig::from_env`] returns
//! `Ok(None)` when no SMTP host is configured, and callers are expected to
//! skip mail dispatch silently in that case.
//!
//! Passwords are wrapped in [`SecretString`] so they never reach logs.

use lettre::{
	message::{header::ContentType, Mailbox, MultiPart, SinglePart},
	transport::smtp::authentication::Credentials,
	AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::{Deserialize, Serialize};
use std::env;
use tether_common_secret::SecretString;

/// Errors that can occur during SMTP operations.
#[derive(Debug, thiserror::Error)]
pub enum SmtpError {
	/// Failed to connect to the SMTP server.
	#[error("connection failed: {0}")]
	Connection(String),

	/// Failed to send an email message.
	#[error("send failed: {0}")]
	Send(String),

	/// Invalid configuration (missing required fields, invalid values).
	#[error("invalid configuration: {0}")]
	Config(String),

	/// Invalid email address format.
	#[error("invalid email address: {0}")]
	Address(String),
}

/// Configuration for the SMTP transport.
///
/// The `password` field uses [`SecretString`], so Debug output is redacted
/// and the value is zeroized on drop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
	/// SMTP server hostname.
	pub host: String,

	/// SMTP server port. Common values: 25 (unencrypted), 465 (TLS), 587 (STARTTLS).
	pub port: u16,

	/// Optional username for SMTP authentication.
	pub username: Option<String>,

	/// Optional password for SMTP authentication.
	pub password: Option<SecretString>,

	/// Email address to send from.
	pub from_address: String,

	/// Display name for the sender.
	pub from_name: String,

	/// Whether to use STARTTLS for the connection. Defaults to `true`.
	#[serde(default = "default_use_tls")]
	pub use_tls: bool,
}

fn default_use_tls() -> bool {
	true
}

impl SmtpConfig {
	/// Load SMTP configuration from environment variables.
	///
	/// Returns `Ok(None)` if SMTP is not configured
	/// (`TETHER_SERVER_SMTP_HOST` not set or empty) — mail is best-effort
	/// and the system runs without it. Returns `Err` if the configuration
	/// is present but incomplete.
	///
	/// Environment variables:
	/// - `TETHER_SERVER_SMTP_HOST` - SMTP server hostname
	/// - `TETHER_SERVER_SMTP_PORT` - SMTP server port (default: 587)
	/// - `TETHER_SERVER_SMTP_USERNAME` - authentication username (optional)
	/// - `TETHER_SERVER_SMTP_PASSWORD` - authentication password (optional)
	/// - `TETHER_SERVER_SMTP_FROM_ADDRESS` - sender address (required if host is set)
	/// - `TETHER_SERVER_SMTP_FROM_NAME` - sender display name (default: "Tether")
	/// - `TETHER_SERVER_SMTP_USE_TLS` - enable STARTTLS (default: true)
	pub fn from_env() -> Result<Option<Self>, SmtpError> {
		let host = match env::var("TETHER_SERVER_SMTP_HOST") {
			Ok(h) if !h.is_empty() => h,
			_ => return Ok(None),
		};

		let port = env::var("TETHER_SERVER_SMTP_PORT")
			.unwrap_or_else(|_| "587".into())
			.parse()
			.map_err(|_| {
				SmtpError::Config("TETHER_SERVER_SMTP_PORT must be a valid port number".into())
			})?;

		let username = env::var("TETHER_SERVER_SMTP_USERNAME")
			.ok()
			.filter(|s| !s.is_empty());
		let password = env::var("TETHER_SERVER_SMTP_PASSWORD")
			.ok()
			.filter(|s| !s.is_empty())
			.map(SecretString::new);

		let from_address = env::var("TETHER_SERVER_SMTP_FROM_ADDRESS").map_err(|_| {
			SmtpError::Config(
				"TETHER_SERVER_SMTP_FROM_ADDRESS is required when TETHER_SERVER_SMTP_HOST is set"
					.into(),
			)
		})?;

		let from_name = env::var("TETHER_SERVER_SMTP_FROM_NAME").unwrap_or_else(|_| "Tether".into());

		let use_tls = env::var("TETHER_SERVER_SMTP_USE_TLS")
			.map(|v| v.to_lowercase() != "false" && v != "0")
			.unwrap_or(true);

		Ok(Some(Self {
			host,
			port,
			username,
			password,
			from_address,
			from_name,
			use_tls,
		}))
	}
}

/// An outbound mail message with To/Cc recipient lists.
///
/// Both bodies are provided: the recipient's client picks HTML or plain
/// text. `correlation_id` ties the send back to the request that produced
/// the mail in the logs.
#[derive(Debug, Clone)]
pub struct OutboundMail {
	/// Primary recipients.
	pub to: Vec<String>,

	/// Carbon-copy recipients (e.g., an operations contact).
	pub cc: Vec<String>,

	/// Subject line.
	pub subject: String,

	/// HTML body.
	pub body_html: String,

	/// Plain text body.
	pub body_text: String,

	/// Request correlation id, recorded on the send span.
	pub correlation_id: Option<String>,
}

/// Delivery receipt for an accepted message.
#[derive(Debug, Clone)]
pub struct MailReceipt {
	/// First line of the SMTP server response.
	pub response: String,
}

/// Async SMTP transport.
///
/// Built once from configuration; the underlying connection is established
/// lazily on first send.
pub struct SmtpClient {
	transport: AsyncSmtpTransport<Tokio1Executor>,
	from_mailbox: Mailbox,
}

impl SmtpClient {
	/// Create a new SMTP client from the given configuration.
	///
	/// # Errors
	///
	/// Returns [`SmtpError::Address`] if the from address is invalid.
	/// Returns [`SmtpError::Connection`] if the transport cannot be built.
	#[tracing::instrument(
		name = "smtp_client_new",
		skip(config),
		fields(host = %config.host, port = %config.port, use_tls = %config.use_tls)
	)]
	pub fn new(config: SmtpConfig) -> Result<Self, SmtpError> {
		let from_mailbox: Mailbox = format!("{} <{}>", config.from_name, config.from_address)
			.parse()
			.map_err(|e| SmtpError::Address(format!("{e}")))?;

		let builder = if config.use_tls {
			AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
				.map_err(|e| SmtpError::Connection(format!("{e}")))?
		} else {
			AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
		};

		let mut builder = builder.port(config.port);

		if let (Some(username), Some(password)) = (config.username, config.password) {
			let credentials = Credentials::new(username, password.into_inner());
			builder = builder.credentials(credentials);
		}

		let transport = builder.build();

		tracing::debug!("SMTP client initialized");

		Ok(Self {
			transport,
			from_mailbox,
		})
	}

	/// Check if the SMTP server is reachable and responding.
	///
	/// # Errors
	///
	/// Returns [`SmtpError::Connection`] if the server is unreachable.
	#[tracing::instrument(name = "smtp_check_health", skip(self))]
	pub async fn check_health(&self) -> Result<(), SmtpError> {
		self
			.transport
			.test_connection()
			.await
			.map_err(|e| SmtpError::Connection(format!("{e}")))?;
		tracing::debug!("SMTP server is healthy");
		Ok(())
	}

	/// Send an outbound mail to its To and Cc recipients.
	///
	/// # Errors
	///
	/// Returns [`SmtpError::Address`] if any recipient address is invalid,
	/// [`SmtpError::Send`] if message construction or delivery fails.
	#[tracing::instrument(
		name = "smtp_send_mail",
		skip(self, mail),
		fields(subject = %mail.subject, to_count = mail.to.len(), cc_count = mail.cc.len(), correlation_id = tracing::field::Empty)
	)]
	pub async fn send_mail(&self, mail: &OutboundMail) -> Result<MailReceipt, SmtpError> {
		if mail.to.is_empty() {
			return Err(SmtpError::Address("no recipients".to_string()));
		}

		let mut builder = Message::builder()
			.from(self.from_mailbox.clone())
			.subject(&mail.subject);

		for to in &mail.to {
			builder = builder.to(parse_mailbox(to)?);
		}
		for cc in &mail.cc {
			builder = builder.cc(parse_mailbox(cc)?);
		}
		if let Some(ref correlation_id) = mail.correlation_id {
			tracing::Span::current().record("correlation_id", correlation_id.as_str());
		}

		let message = builder
			.multipart(
				MultiPart::alternative()
					.singlepart(
						SinglePart::builder()
							.header(ContentType::TEXT_PLAIN)
							.body(mail.body_text.clone()),
					)
					.singlepart(
						SinglePart::builder()
							.header(ContentType::TEXT_HTML)
							.body(mail.body_html.clone()),
					),
			)
			.map_err(|e| SmtpError::Send(format!("failed to build message: {e}")))?;

		let response = self
			.transport
			.send(message)
			.await
			.map_err(|e| SmtpError::Send(format!("{e}")))?;

		tracing::info!("mail accepted by server");

		Ok(MailReceipt {
			response: response.code().to_string(),
		})
	}
}

fn parse_mailbox(address: &str) -> Result<Mailbox, SmtpError> {
	address
		.parse::<Mailbox>()
		.map_err(|e| SmtpError::Address(format!("{address}: {e}")))
}

/// Validate an email address format.
///
/// Uses [`lettre`]'s [`Mailbox`] parser; this validates the syntax, not
/// whether the address actually exists.
pub fn is_valid_email(email: &str) -> bool {
	email.parse::<Mailbox>().is_ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	mod email_validation {
		use super::*;

		#[test]
		fn valid_simple_email() {
			assert!(is_valid_email("user@example.com"));
		}

		#[test]
		fn valid_email_with_name() {
			assert!(is_valid_email("User Name <user@example.com>"));
		}

		#[test]
		fn valid_email_with_plus_tag() {
			assert!(is_valid_email("user+tag@example.com"));
		}

		#[test]
		fn invalid_empty_string() {
			assert!(!is_valid_email(""));
		}

		#[test]
		fn invalid_missing_domain() {
			assert!(!is_valid_email("user@"));
		}

		#[test]
		fn invalid_plain_word() {
			assert!(!is_valid_email("not-an-email"));
		}
	}

	mod config {
		use super::*;

		#[test]
		fn config_debug_does_not_leak_password() {
			let config = SmtpConfig {
				host: "smtp.example.com".to_string(),
				port: 587,
				username: Some("user".to_string()),
				password: Some(SecretString::new("super-secret-password".to_string())),
				from_address: "noreply@example.com".to_string(),
				from_name: "Tether".to_string(),
				use_tls: true,
			};

			let debug = format!("{config:?}");
			assert!(!debug.contains("super-secret-password"));
			assert!(debug.contains("[REDACTED]"));
		}

		#[test]
		fn default_use_tls_is_true() {
			assert!(default_use_tls());
		}
	}

	mod outbound_mail {
		use super::*;

		fn make_client() -> SmtpClient {
			SmtpClient::new(SmtpConfig {
				host: "smtp.example.com".to_string(),
				port: 587,
				username: None,
				password: None,
				from_address: "noreply@example.com".to_string(),
				from_name: "Tether".to_string(),
				use_tls: false,
			})
			.unwrap()
		}

		#[test]
		fn empty_recipient_list_is_rejected_before_connecting() {
			let client = make_client();
			let mail = OutboundMail {
				to: vec![],
				cc: vec![],
				subject: "hi".to_string(),
				body_html: "<p>hi</p>".to_string(),
				body_text: "hi".to_string(),
				correlation_id: None,
			};

			let err = tokio_test::block_on(client.send_mail(&mail)).unwrap_err();
			assert!(matches!(err, SmtpError::Address(_)));
		}

		#[test]
		fn bad_recipient_address_is_rejected_before_connecting() {
			let client = make_client();
			let mail = OutboundMail {
				to: vec!["not-an-email".to_string()],
				cc: vec![],
				subject: "hi".to_string(),
				body_html: "<p>hi</p>".to_string(),
				body_text: "hi".to_string(),
				correlation_id: None,
			};

			let err = tokio_test::block_on(client.send_mail(&mail)).unwrap_err();
			assert!(matches!(err, SmtpError::Address(_)));
		}
	}

	mod property_tests {
		use super::*;
		use proptest::prelude::*;

		proptest! {
			#[test]
			fn valid_emails_are_accepted(
				local in "[a-zA-Z][a-zA-Z0-9]{0,30}",
				domain in "[a-zA-Z][a-zA-Z0-9]{0,20}",
				tld in "(com|org|net|io|dev)"
			) {
				let email = format!("{local}@{domain}.{tld}");
				prop_assert!(is_valid_email(&email), "Expected valid: {}", email);
			}

			#[test]
			fn no_at_symbol_is_invalid(s in "[a-zA-Z0-9._%+-]{1,50}") {
				prop_assume!(!s.contains('@'));
				prop_assert!(!is_valid_email(&s));
			}

			#[test]
			fn password_never_in_config_debug(password in "[a-zA-Z0-9!#$%^&*]{8,32}") {
				prop_assume!(!password.contains("REDACTED"));

				let config = SmtpConfig {
					host: "smtp.example.com".to_string(),
					port: 587,
					username: Some("user".to_string()),
					password: Some(SecretString::new(password.clone())),
					from_address: "noreply@example.com".to_string(),
					from_name: "Tether".to_string(),
					use_tls: true,
				};

				let debug = format!("{config:?}");
				prop_assert!(!debug.contains(&password), "Password leaked in debug output");
			}
		}
	}
}
