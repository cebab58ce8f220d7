//! Servicio de notificaciones por mail
//!
//! Colaborador externo fire-and-forget: entrega la notificación a un
//! endpoint HTTP de correo. Un fallo aquí nunca afecta a la escritura
//! que lo originó; solo se loguea.

use reqwest::Client;
use serde_json::json;
use tracing::{debug, error};

use crate::config::environment::EnvironmentConfig;

#[derive(Clone)]
pub struct MailService {
    client: Client,
    activated: bool,
    url: String,
}

impl MailService {
    pub fn new(config: &EnvironmentConfig) -> Self {
        Self {
            client: Client::new(),
            activated: config.mail_activated,
            url: config.mail_url.clone(),
        }
    }

    /// Enviar una notificación con subject y body HTML.
    pub async fn send(&self, subject: &str, body: &str) {
        if !self.activated {
            debug!("send: mail desactivado, subject={}", subject);
            return;
        }

        let payload = json!({
            "subject": subject,
            "body": body,
        });

        match self.client.post(&self.url).json(&payload).send().await {
            Ok(response) => debug!("send: status={}", response.status()),
            Err(e) => error!("send: error al enviar mail: {}", e),
        }
    }
}
