// Copyright (c) 2025 Tether Engineering. All rights reserved.
// SPDX-License-Identifier: MIT

//! The one-time welcome mail.
//!
//! Sent best-effort after a successful link: the user-visible flow never
//! waits on mail rendering or delivery, and mail failures are logged but
//! never surfaced. Service-account links copy the operations contact when
//! one is configured.

use async_trait::async_trait;
use uuid::Uuid;

use tether_link_core::LinkRecord;
use tether_server_smtp::{MailReceipt, OutboundMail, SmtpClient, SmtpError};

use crate::config::LinkConfig;

/// Mail transport seam for the welcome mail.
#[async_trait]
pub trait WelcomeMailer: Send + Sync {
	async fn send(&self, mail: &OutboundMail) -> Result<MailReceipt, SmtpError>;
}

#[async_trait]
impl WelcomeMailer for SmtpClient {
	async fn send(&self, mail: &OutboundMail) -> Result<MailReceipt, SmtpError> {
		self.send_mail(mail).await
	}
}

/// Render the welcome mail for a freshly written link.
///
/// Render is plain string assembly and cannot fail; only the send can, and
/// the dispatcher swallows that.
pub fn build_welcome_mail(
	config: &LinkConfig,
	record: &LinkRecord,
	recipient: &str,
	correlation_id: Uuid,
) -> OutboundMail {
	let mut cc = Vec::new();
	if record.is_service_account {
		if let Some(ref operations_email) = config.operations_email {
			cc.push(operations_email.clone());
		}
	}

	let subject = format!(
		"{} linked to {}",
		record.corporate_principal_name, record.external_account_login
	);
	let headline = format!("Welcome, {}", record.external_account_login);
	let reason = format!(
		"You are receiving this one-time e-mail because you have linked your account. \
		 To stop receiving these mails, you can unlink your account. \
		 This mail was sent to: {recipient}"
	);

	let body_text = format!(
		"{headline}\n\n\
		 Your {company} corporate identity {principal} is now linked to the \
		 {login} account.\n\n\
		 {reason}\n",
		company = config.company_name,
		principal = record.corporate_principal_name,
		login = record.external_account_login,
	);

	let body_html = format!(
		"<h1>{headline}</h1>\
		 <p>Your {company} corporate identity <strong>{principal}</strong> is now \
		 linked to the <strong>{login}</strong> account.</p>\
		 <p><small>{reason}</small></p>",
		company = config.company_name,
		principal = record.corporate_principal_name,
		login = record.external_account_login,
	);

	OutboundMail {
		to: vec![recipient.to_string()],
		cc,
		subject,
		body_html,
		body_text,
		correlation_id: Some(correlation_id.to_string()),
	}
}
