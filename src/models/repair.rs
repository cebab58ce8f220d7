//! Modelo de Repair
//!
//! Reparaciones N:1 del vehículo. Igual que el motor, viven y mueren con
//! su vehículo; la relación es una foreign key en la tabla `repair`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Repair principal - mapea a la tabla repair
#[derive(Debug, Clone, Serialize)]
pub struct Repair {
    pub id: Uuid,
    pub kosten: Option<Decimal>,
    pub mechaniker: String,
    pub datum: Option<NaiveDate>,
}

/// Request anidado para crear una reparación junto con el vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRepairRequest {
    #[validate(custom = "crate::utils::validation::validate_decimal_non_negative")]
    pub kosten: Option<Decimal>,

    #[validate(
        length(min = 1, max = 32),
        regex = "crate::utils::validation::MECHANIKER_REGEX"
    )]
    pub mechaniker: String,

    pub datum: Option<NaiveDate>,
}

/// Response de reparación para la API
#[derive(Debug, Serialize)]
pub struct RepairResponse {
    pub id: Uuid,
    pub kosten: Option<Decimal>,
    pub mechaniker: String,
    pub datum: Option<NaiveDate>,
}

impl From<Repair> for RepairResponse {
    fn from(repair: Repair) -> Self {
        Self {
            id: repair.id,
            kosten: repair.kosten,
            mechaniker: repair.mechaniker,
            datum: repair.datum,
        }
    }
}
