//! Modelo de Vehicle
//!
//! Este módulo contiene el aggregate root Vehicle y sus variantes para
//! CRUD operations. Vehicle posee su Engine, sus Repairs y una binaria
//! opcional; los hijos no guardan punteros de vuelta al padre.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::engine::{CreateEngineRequest, Engine, EngineResponse};
use crate::models::repair::{CreateRepairRequest, Repair, RepairResponse};

/// Tipo del vehículo - PKW (turismo) o LKW (camión)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleArt {
    #[serde(rename = "PKW")]
    Pkw,
    #[serde(rename = "LKW")]
    Lkw,
}

impl VehicleArt {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleArt::Pkw => "PKW",
            VehicleArt::Lkw => "LKW",
        }
    }

    pub fn parse(value: &str) -> Option<VehicleArt> {
        match value {
            "PKW" => Some(VehicleArt::Pkw),
            "LKW" => Some(VehicleArt::Lkw),
            _ => None,
        }
    }
}

/// Vehicle principal - aggregate root sobre las tablas vehicle/engine/repair
#[derive(Debug, Clone, Serialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub version: i32,
    pub fahrgestellnummer: String,
    pub marke: String,
    pub modell: String,
    pub baujahr: Option<i32>,
    pub art: Option<VehicleArt>,
    pub preis: Decimal,
    pub sicherheitsmerkmale: Vec<String>,
    pub motor: Engine,
    pub reperaturen: Vec<Repair>,
    pub erzeugt: DateTime<Utc>,
    pub aktualisiert: DateTime<Utc>,
}

/// Request para crear un nuevo vehículo con su motor y reparaciones
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1))]
    pub fahrgestellnummer: String,

    #[validate(length(min = 1, max = 32))]
    pub marke: String,

    #[validate(length(min = 1, max = 32))]
    pub modell: String,

    #[validate(custom = "crate::utils::validation::validate_baujahr")]
    pub baujahr: Option<i32>,

    pub art: Option<VehicleArt>,

    #[validate(custom = "crate::utils::validation::validate_decimal_non_negative")]
    pub preis: Decimal,

    pub sicherheitsmerkmale: Option<Vec<String>>,

    #[validate]
    pub motor: CreateEngineRequest,

    #[validate]
    pub reperaturen: Option<Vec<CreateRepairRequest>>,
}

impl CreateVehicleRequest {
    /// Merkmale sin duplicados, preservando el orden de llegada.
    pub fn sicherheitsmerkmale_deduped(&self) -> Vec<String> {
        self.sicherheitsmerkmale
            .as_deref()
            .map(dedup_merkmale)
            .unwrap_or_default()
    }
}

/// Los merkmale son un conjunto: los duplicados se descartan al entrar.
pub fn dedup_merkmale(merkmale: &[String]) -> Vec<String> {
    let mut deduped: Vec<String> = Vec::new();
    for merkmal in merkmale {
        if !deduped.contains(merkmal) {
            deduped.push(merkmal.clone());
        }
    }
    deduped
}

/// Request para actualizar un vehículo existente. Solo campos escalares;
/// la fahrgestellnummer es inmutable y las relaciones no se tocan.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 1, max = 32))]
    pub marke: Option<String>,

    #[validate(length(min = 1, max = 32))]
    pub modell: Option<String>,

    #[validate(custom = "crate::utils::validation::validate_baujahr")]
    pub baujahr: Option<i32>,

    pub art: Option<VehicleArt>,

    #[validate(custom = "crate::utils::validation::validate_decimal_non_negative")]
    pub preis: Option<Decimal>,

    pub sicherheitsmerkmale: Option<Vec<String>>,
}

/// Response de vehículo para la API
#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    pub id: Uuid,
    pub version: i32,
    pub fahrgestellnummer: String,
    pub marke: String,
    pub modell: String,
    pub baujahr: Option<i32>,
    pub art: Option<VehicleArt>,
    pub preis: Decimal,
    pub sicherheitsmerkmale: Vec<String>,
    pub motor: EngineResponse,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reperaturen: Vec<RepairResponse>,
    pub erzeugt: String,
    pub aktualisiert: String,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            id: vehicle.id,
            version: vehicle.version,
            fahrgestellnummer: vehicle.fahrgestellnummer,
            marke: vehicle.marke,
            modell: vehicle.modell,
            baujahr: vehicle.baujahr,
            art: vehicle.art,
            preis: vehicle.preis,
            sicherheitsmerkmale: vehicle.sicherheitsmerkmale,
            motor: EngineResponse::from(vehicle.motor),
            reperaturen: vehicle
                .reperaturen
                .into_iter()
                .map(RepairResponse::from)
                .collect(),
            erzeugt: vehicle.erzeugt.to_rfc3339(),
            aktualisiert: vehicle.aktualisiert.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn create_request() -> CreateVehicleRequest {
        CreateVehicleRequest {
            fahrgestellnummer: "W0L000051T2123456".to_string(),
            marke: "BMW".to_string(),
            modell: "X5".to_string(),
            baujahr: Some(2021),
            art: Some(VehicleArt::Pkw),
            preis: Decimal::from_str("49999.99").unwrap(),
            sicherheitsmerkmale: Some(vec![
                "ESB".to_string(),
                "ABS".to_string(),
                "ESB".to_string(),
            ]),
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
    fn test_art_roundtrip() {
        assert_eq!(VehicleArt::parse("PKW"), Some(VehicleArt::Pkw));
        assert_eq!(VehicleArt::parse("LKW"), Some(VehicleArt::Lkw));
        assert_eq!(VehicleArt::parse("SUV"), None);
        assert_eq!(VehicleArt::Lkw.as_str(), "LKW");
    }

    #[test]
    fn test_valid_create_request() {
        assert!(create_request().validate().is_ok());
    }

    #[test]
    fn test_sicherheitsmerkmale_deduped() {
        let request = create_request();
        assert_eq!(
            request.sicherheitsmerkmale_deduped(),
            vec!["ESB".to_string(), "ABS".to_string()]
        );

        let mut without = create_request();
        without.sicherheitsmerkmale = None;
        assert!(without.sicherheitsmerkmale_deduped().is_empty());
    }

    #[test]
    fn test_baujahr_in_the_future_is_rejected() {
        use chrono::Datelike;

        let mut request = create_request();
        request.baujahr = Some(Utc::now().year() + 1);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_nested_motor_is_validated() {
        let mut request = create_request();
        request.motor.ps = Some(10_000);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_negative_preis_is_rejected() {
        let mut request = create_request();
        request.preis = Decimal::from_str("-1").unwrap();
        assert!(request.validate().is_err());
    }
}
