//! Modelo de Engine
//!
//! Motor 1:1 del vehículo. Se crea y se borra siempre junto con su
//! vehículo; la relación se persiste como foreign key en la tabla `engine`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub const MAX_PS: i32 = 1000;

pub const MAX_ZYLINDER: i32 = 24;

/// Engine principal - mapea a la tabla engine
#[derive(Debug, Clone, Serialize)]
pub struct Engine {
    pub id: Uuid,
    pub name: String,
    pub ps: Option<i32>,
    pub zylinder: Option<i32>,
    pub drehzahl: Option<Decimal>,
}

/// Request anidado para crear el motor junto con el vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEngineRequest {
    #[validate(length(min = 1, max = 40))]
    pub name: String,

    #[validate(range(min = 0, max = 1000))]
    pub ps: Option<i32>,

    #[validate(range(min = 0, max = 24))]
    pub zylinder: Option<i32>,

    #[validate(custom = "crate::utils::validation::validate_decimal_non_negative")]
    pub drehzahl: Option<Decimal>,
}

/// Response de motor para la API
#[derive(Debug, Serialize)]
pub struct EngineResponse {
    pub id: Uuid,
    pub name: String,
    pub ps: Option<i32>,
    pub zylinder: Option<i32>,
    pub drehzahl: Option<Decimal>,
}

impl From<Engine> for EngineResponse {
    fn from(engine: Engine) -> Self {
        Self {
            id: engine.id,
            name: engine.name,
            ps: engine.ps,
            zylinder: engine.zylinder,
            drehzahl: engine.drehzahl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_valid_engine_request() {
        let request = CreateEngineRequest {
            name: "V8 Biturbo".to_string(),
            ps: Some(585),
            zylinder: Some(8),
            drehzahl: Some(Decimal::from_str("5.75").unwrap()),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_ps_out_of_range() {
        let request = CreateEngineRequest {
            name: "V8".to_string(),
            ps: Some(MAX_PS + 1),
            zylinder: None,
            drehzahl: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_zylinder_out_of_range() {
        let request = CreateEngineRequest {
            name: "W32".to_string(),
            ps: None,
            zylinder: Some(MAX_ZYLINDER + 1),
            drehzahl: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_negative_drehzahl() {
        let request = CreateEngineRequest {
            name: "V8".to_string(),
            ps: None,
            zylinder: None,
            drehzahl: Some(Decimal::from_str("-1").unwrap()),
        };
        assert!(request.validate().is_err());
    }
}
