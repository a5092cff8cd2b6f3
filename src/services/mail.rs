//! Mail service - Consegna email tramite webhook HTTP
//!
//! La consegna vera è delegata a un servizio esterno raggiunto via webhook
//! configurabile (MAIL_WEBHOOK_URL); senza webhook il contenuto finisce nei
//! log e basta. Tutte le consegne partono in un task separato: la risposta
//! HTTP non aspetta mai l'email.

use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::core::AppState;

#[derive(Serialize, Debug)]
struct OutgoingMail<'a> {
    to: &'a [String],
    subject: &'a str,
    body: &'a str,
}

/// Consegna una email al webhook configurato. Ritorna true se la consegna
/// è andata a buon fine (o se non c'è webhook: in sviluppo basta il log).
#[instrument(skip(state, body))]
async fn deliver(state: &Arc<AppState>, to: &[String], subject: &str, body: &str) -> bool {
    let Some(webhook_url) = state.config.mail_webhook_url.as_ref() else {
        info!(recipients = to.len(), subject, "No mail webhook configured, logging only");
        return true;
    };

    let payload = OutgoingMail { to, subject, body };

    match state.http_client.post(webhook_url).json(&payload).send().await {
        Ok(resp) if resp.status().is_success() => {
            info!(recipients = to.len(), "Mail delivered to webhook");
            true
        }
        Ok(resp) => {
            warn!(status = resp.status().as_u16(), "Mail webhook rejected the message");
            false
        }
        Err(e) => {
            error!("Mail webhook call failed: {:?}", e);
            false
        }
    }
}

/// Crea il token di verifica e spedisce il link di attivazione.
/// Fire-and-forget: gli errori vengono solo loggati.
pub fn send_activation_email(state: Arc<AppState>, user_id: i32, email: String) {
    tokio::spawn(async move {
        let token = uuid::Uuid::new_v4().to_string();

        if let Err(e) = state.email.create_token(&token, &user_id).await {
            error!("Failed to persist verification token: {:?}", e);
            return;
        }

        let activation_link = format!(
            "{}/api/v1/accounts/verify-email/{}",
            state.config.domain, token
        );

        let subject = "[TastePT] Please verify your email address";
        let body = format!(
            "Welcome to TastePT!\n\nClick the link below to verify your email:\n{activation_link}\n\nThe link is valid for 24 hours."
        );

        deliver(&state, &[email], subject, &body).await;
    });
}

/// Consegna una email amministrativa a tutti i destinatari e marca sent_at
pub fn dispatch_bulk(state: Arc<AppState>, email_id: i32) {
    tokio::spawn(async move {
        let addresses = match state.email.recipient_addresses(&email_id).await {
            Ok(addresses) => addresses,
            Err(e) => {
                error!("Failed to load recipients for email {}: {:?}", email_id, e);
                return;
            }
        };

        if addresses.is_empty() {
            warn!(email_id, "Bulk email has no deliverable recipients");
            return;
        }

        let message = match state.email.read_message(&email_id).await {
            Ok(Some(message)) => message,
            Ok(None) => {
                warn!(email_id, "Email message disappeared before delivery");
                return;
            }
            Err(e) => {
                error!("Failed to read email message {}: {:?}", email_id, e);
                return;
            }
        };

        if deliver(&state, &addresses, &message.subject, &message.message).await {
            if let Err(e) = state.email.mark_sent(&email_id).await {
                error!("Failed to mark email {} as sent: {:?}", email_id, e);
            }
        }
    });
}
