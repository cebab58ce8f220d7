//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y del colaborador
//! de mail.

use std::env;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    // Colaborador de mail (fire-and-forget)
    pub mail_url: String,
    pub mail_activated: bool,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            mail_url: env::var("MAIL_URL").unwrap_or_default(),
            mail_activated: env::var("MAIL_ACTIVATED")
                .map(|value| value == "true")
                .unwrap_or(false),
        }
    }
}
