//! Modelo de AttachedFile
//!
//! Binario opcional (imagen, PDF, ...) asociado 1:1 al vehículo.
//! Reemplazar la binaria borra primero la fila anterior.

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// AttachedFile principal - mapea a la tabla attached_file
#[derive(Debug, Clone, FromRow)]
pub struct AttachedFile {
    pub id: Uuid,
    pub filename: String,
    pub mimetype: String,
    pub data: Vec<u8>,
    pub vehicle_id: Uuid,
}

/// Metadatos de la binaria para la API (sin el payload)
#[derive(Debug, Serialize)]
pub struct AttachedFileResponse {
    pub id: Uuid,
    pub filename: String,
    pub mimetype: String,
    pub size: usize,
}

impl From<&AttachedFile> for AttachedFileResponse {
    fn from(file: &AttachedFile) -> Self {
        Self {
            id: file.id,
            filename: file.filename.clone(),
            mimetype: file.mimetype.clone(),
            size: file.data.len(),
        }
    }
}
