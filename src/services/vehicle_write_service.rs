//! Servicio de escritura para el aggregate Vehicle
//!
//! Crea, actualiza (con control de concurrencia optimista), borra y
//! gestiona la binaria adjunta. Para todo fetch-before-mutate se apoya
//! en el servicio de lectura.

use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::models::engine::Engine;
use crate::models::repair::Repair;
use crate::models::vehicle::{
    dedup_merkmale, CreateVehicleRequest, UpdateVehicleRequest, Vehicle,
};
use crate::models::vehicle_file::AttachedFile;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::services::mail_service::MailService;
use crate::services::vehicle_read_service::VehicleReadService;
use crate::utils::errors::{AppError, AppResult};

lazy_static! {
    /// Token de versión: entero de 1 a 3 dígitos entre comillas, p.ej. `"3"`
    static ref VERSION_PATTERN: Regex = Regex::new(r#"^"\d{1,3}"$"#).unwrap();
}

pub struct VehicleWriteService {
    repository: VehicleRepository,
    read_service: VehicleReadService,
    mail_service: MailService,
}

impl VehicleWriteService {
    pub fn new(pool: PgPool, mail_service: MailService) -> Self {
        Self {
            repository: VehicleRepository::new(pool.clone()),
            read_service: VehicleReadService::new(pool),
            mail_service,
        }
    }

    /// Crear un vehículo nuevo junto con su motor y reparaciones.
    /// Devuelve el ID recién asignado.
    pub async fn create(&self, request: CreateVehicleRequest) -> AppResult<Uuid> {
        debug!("create: fahrgestellnummer={}", request.fahrgestellnummer);

        if self
            .repository
            .fahrgestellnummer_exists(&request.fahrgestellnummer)
            .await?
        {
            return Err(AppError::FahrgestellnummerExists(request.fahrgestellnummer));
        }

        let vehicle = build_aggregate(request);
        self.repository.insert(&vehicle).await?;
        self.send_mail(&vehicle).await;
        Ok(vehicle.id)
    }

    /// Guardar la binaria de un vehículo existente. Reemplaza: la fila
    /// anterior se borra antes de insertar la nueva.
    pub async fn add_file(
        &self,
        vehicle_id: Uuid,
        data: Vec<u8>,
        filename: String,
        mimetype: String,
    ) -> AppResult<AttachedFile> {
        debug!(
            "add_file: vehicle_id={}, filename={}, mimetype={}",
            vehicle_id, filename, mimetype
        );

        self.read_service.find_by_id(vehicle_id, false).await?;
        self.repository.delete_file(vehicle_id).await?;

        let file = AttachedFile {
            id: Uuid::new_v4(),
            filename,
            mimetype,
            data,
            vehicle_id,
        };
        self.repository.insert_file(&file).await?;
        Ok(file)
    }

    /// Actualizar los escalares de un vehículo existente. Devuelve la
    /// nueva versión asignada por el store.
    pub async fn update(
        &self,
        id: Option<Uuid>,
        request: UpdateVehicleRequest,
        version: &str,
    ) -> AppResult<i32> {
        debug!("update: id={:?}, version={}", id, version);

        let Some(id) = id else {
            return Err(AppError::NotFound(
                "There is no vehicle without an id".to_string(),
            ));
        };

        let version = parse_version(version)?;
        let vehicle_db = self.read_service.find_by_id(id, false).await?;

        // Solo una versión estrictamente menor que la almacenada se rechaza
        if version < vehicle_db.version {
            debug!("update: version_db={}", vehicle_db.version);
            return Err(AppError::VersionOutdated(version));
        }

        let merged = merge(vehicle_db, request);
        let new_version = self.repository.update(&merged).await?;
        debug!("update: new_version={}", new_version);
        Ok(new_version)
    }

    /// Borrar el aggregate completo. Devuelve true si la fila de vehicle
    /// existía y fue borrada.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        debug!("delete: id={}", id);

        let vehicle = self.read_service.find_by_id(id, true).await?;
        let deleted = self.repository.delete(&vehicle).await?;
        debug!("delete: deleted={}", deleted);
        Ok(deleted)
    }

    async fn send_mail(&self, vehicle: &Vehicle) {
        let subject = format!("Neues Auto {}", vehicle.id);
        let motor = if vehicle.motor.name.is_empty() {
            "N/A"
        } else {
            vehicle.motor.name.as_str()
        };
        let body = format!(
            "Das Auto mit dem Motornamen <strong>{}</strong> ist angelegt",
            motor
        );
        self.mail_service.send(&subject, &body).await;
    }
}

/// Validar la sintaxis del token y extraer el entero.
fn parse_version(version: &str) -> AppResult<i32> {
    if !VERSION_PATTERN.is_match(version) {
        return Err(AppError::VersionInvalid(version.to_string()));
    }
    version
        .trim_matches('"')
        .parse()
        .map_err(|_| AppError::VersionInvalid(version.to_string()))
}

/// Construir el aggregate a persistir: IDs nuevos, versión inicial 0,
/// timestamps de ahora y merkmale sin duplicados.
fn build_aggregate(request: CreateVehicleRequest) -> Vehicle {
    let now = Utc::now();
    let sicherheitsmerkmale = request.sicherheitsmerkmale_deduped();
    let reperaturen = request
        .reperaturen
        .unwrap_or_default()
        .into_iter()
        .map(|repair| Repair {
            id: Uuid::new_v4(),
            kosten: repair.kosten,
            mechaniker: repair.mechaniker,
            datum: repair.datum,
        })
        .collect();

    Vehicle {
        id: Uuid::new_v4(),
        version: 0,
        fahrgestellnummer: request.fahrgestellnummer,
        marke: request.marke,
        modell: request.modell,
        baujahr: request.baujahr,
        art: request.art,
        preis: request.preis,
        sicherheitsmerkmale,
        motor: Engine {
            id: Uuid::new_v4(),
            name: request.motor.name,
            ps: request.motor.ps,
            zylinder: request.motor.zylinder,
            drehzahl: request.motor.drehzahl,
        },
        reperaturen,
        erzeugt: now,
        aktualisiert: now,
    }
}

/// Merge de los escalares entrantes sobre el registro almacenado.
/// Fahrgestellnummer y relaciones quedan intactas.
fn merge(current: Vehicle, request: UpdateVehicleRequest) -> Vehicle {
    Vehicle {
        id: current.id,
        version: current.version,
        fahrgestellnummer: current.fahrgestellnummer,
        marke: request.marke.unwrap_or(current.marke),
        modell: request.modell.unwrap_or(current.modell),
        baujahr: request.baujahr.or(current.baujahr),
        art: request.art.or(current.art),
        preis: request.preis.unwrap_or(current.preis),
        sicherheitsmerkmale: request
            .sicherheitsmerkmale
            .map(|merkmale| dedup_merkmale(&merkmale))
            .unwrap_or(current.sicherheitsmerkmale),
        motor: current.motor,
        reperaturen: current.reperaturen,
        erzeugt: current.erzeugt,
        aktualisiert: current.aktualisiert,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::engine::CreateEngineRequest;
    use crate::models::vehicle::VehicleArt;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn create_request() -> CreateVehicleRequest {
        CreateVehicleRequest {
            fahrgestellnummer: "W0L000051T2123456".to_string(),
            marke: "BMW".to_string(),
            modell: "X5".to_string(),
            baujahr: Some(2021),
            art: Some(VehicleArt::Pkw),
            preis: Decimal::from_str("49999.99").unwrap(),
            sicherheitsmerkmale: Some(vec!["ESB".to_string(), "ESB".to_string()]),
            motor: CreateEngineRequest {
                name: "V8".to_string(),
                ps: Some(408),
                zylinder: Some(8),
                drehzahl: None,
            },
            reperaturen: None,
        }
    }

    #[test]
    fn test_parse_version_valid() {
        assert_eq!(parse_version("\"0\"").unwrap(), 0);
        assert_eq!(parse_version("\"3\"").unwrap(), 3);
        assert_eq!(parse_version("\"999\"").unwrap(), 999);
    }

    #[test]
    fn test_parse_version_invalid() {
        for token in ["3", "\"\"", "\"abc\"", "\"1234\"", "\"-1\"", "\"3\" ", ""] {
            let result = parse_version(token);
            assert!(
                matches!(result, Err(AppError::VersionInvalid(_))),
                "token {:?} should be invalid",
                token
            );
        }
    }

    #[test]
    fn test_build_aggregate_starts_at_version_zero() {
        let vehicle = build_aggregate(create_request());
        assert_eq!(vehicle.version, 0);
        assert_eq!(vehicle.sicherheitsmerkmale, vec!["ESB".to_string()]);
        assert_eq!(vehicle.motor.name, "V8");
        assert!(vehicle.reperaturen.is_empty());
        assert_eq!(vehicle.erzeugt, vehicle.aktualisiert);
    }

    #[test]
    fn test_merge_keeps_missing_fields() {
        let current = build_aggregate(create_request());
        let marke = current.marke.clone();
        let preis = current.preis;

        let merged = merge(
            current,
            UpdateVehicleRequest {
                marke: None,
                modell: Some("X7".to_string()),
                baujahr: None,
                art: Some(VehicleArt::Lkw),
                preis: None,
                sicherheitsmerkmale: None,
            },
        );

        assert_eq!(merged.marke, marke);
        assert_eq!(merged.modell, "X7");
        assert_eq!(merged.art, Some(VehicleArt::Lkw));
        assert_eq!(merged.preis, preis);
        assert_eq!(merged.fahrgestellnummer, "W0L000051T2123456");
    }

    #[test]
    fn test_merge_dedups_incoming_merkmale() {
        let current = build_aggregate(create_request());
        let merged = merge(
            current,
            UpdateVehicleRequest {
                marke: None,
                modell: None,
                baujahr: None,
                art: None,
                preis: None,
                sicherheitsmerkmale: Some(vec![
                    "ABS".to_string(),
                    "AIRBAG".to_string(),
                    "ABS".to_string(),
                ]),
            },
        );
        assert_eq!(merged.sicherheitsmerkmale, vec!["ABS", "AIRBAG"]);
    }
}
