//! Servicio de lectura para el aggregate Vehicle
//!
//! Valida los criterios de búsqueda, delega en el QueryBuilder vía el
//! repositorio y es dueño de la semántica "not found": una página vacía
//! es un error, no un resultado.

use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::models::criteria::{SearchCriteria, FILTER_KEYS};
use crate::models::pageable::{Pageable, Slice};
use crate::models::vehicle::{Vehicle, VehicleArt};
use crate::models::vehicle_file::AttachedFile;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::utils::errors::{AppError, AppResult};

pub struct VehicleReadService {
    repository: VehicleRepository,
}

impl VehicleReadService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: VehicleRepository::new(pool),
        }
    }

    /// Buscar un vehículo por su ID, opcionalmente con sus reparaciones.
    pub async fn find_by_id(&self, id: Uuid, mit_reperaturen: bool) -> AppResult<Vehicle> {
        debug!("find_by_id: id={}, mit_reperaturen={}", id, mit_reperaturen);

        let vehicle = self
            .repository
            .find_by_id(id, mit_reperaturen)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("There is no vehicle with id {}", id)))?;

        debug!("find_by_id: modell={}", vehicle.modell);
        Ok(vehicle)
    }

    /// Binaria asociada a un vehículo. Que no exista no es un error.
    pub async fn find_file(&self, vehicle_id: Uuid) -> AppResult<Option<AttachedFile>> {
        debug!("find_file: vehicle_id={}", vehicle_id);

        let file = self.repository.find_file(vehicle_id).await?;
        match &file {
            Some(file) => debug!("find_file: filename={}", file.filename),
            None => debug!("find_file: no file found"),
        }
        Ok(file)
    }

    /// Búsqueda con criterios y paginación. Sin criterios equivale a
    /// buscar todo.
    pub async fn find(
        &self,
        criteria: Option<SearchCriteria>,
        pageable: Pageable,
    ) -> AppResult<Slice<Vehicle>> {
        debug!("find: criteria={:?}, pageable={:?}", criteria, pageable);

        let criteria = match criteria {
            Some(criteria) if !criteria.is_empty() => criteria,
            _ => return self.find_all(pageable).await,
        };

        if !check_keys(&criteria) || !check_enums(&criteria) {
            return Err(AppError::NotFound("Invalid search criteria".to_string()));
        }

        let vehicles = self.repository.find(&criteria, &pageable).await?;
        if vehicles.is_empty() {
            debug!("find: no vehicles found");
            return Err(AppError::NotFound(format!(
                "No vehicles found: {:?}, page {}",
                criteria, pageable.number
            )));
        }

        let total_elements = self.repository.count(&criteria).await?;
        Ok(create_slice(vehicles, total_elements))
    }

    /// Buscar todo. Una página vacía señala una página fuera de rango.
    async fn find_all(&self, pageable: Pageable) -> AppResult<Slice<Vehicle>> {
        let criteria = SearchCriteria::default();
        let vehicles = self.repository.find(&criteria, &pageable).await?;
        if vehicles.is_empty() {
            return Err(AppError::NotFound(format!(
                "Invalid page \"{}\"",
                pageable.number
            )));
        }

        let total_elements = self.repository.count(&criteria).await?;
        Ok(create_slice(vehicles, total_elements))
    }
}

/// ¿Es cada criterio una clave del conjunto cerrado?
fn check_keys(criteria: &SearchCriteria) -> bool {
    let mut valid = true;
    for key in criteria.keys() {
        if !FILTER_KEYS.contains(&key) {
            debug!("check_keys: criterio inválido \"{}\"", key);
            valid = false;
        }
    }
    valid
}

/// El enum art solo admite PKW y LKW.
fn check_enums(criteria: &SearchCriteria) -> bool {
    match criteria.get("art") {
        None => true,
        Some(art) => VehicleArt::parse(art).is_some(),
    }
}

fn create_slice(vehicles: Vec<Vehicle>, total_elements: i64) -> Slice<Vehicle> {
    debug!(
        "create_slice: content={}, total_elements={}",
        vehicles.len(),
        total_elements
    );
    Slice {
        content: vehicles,
        total_elements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn criteria(pairs: &[(&str, &str)]) -> SearchCriteria {
        SearchCriteria::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn test_check_keys_accepts_closed_set() {
        assert!(check_keys(&criteria(&[
            ("marke", "BMW"),
            ("motor", "V8"),
            ("esb", "true"),
        ])));
    }

    #[test]
    fn test_check_keys_rejects_unknown_key() {
        assert!(!check_keys(&criteria(&[("farbe", "rot")])));
        assert!(!check_keys(&criteria(&[("marke", "BMW"), ("farbe", "rot")])));
    }

    #[test]
    fn test_check_enums() {
        assert!(check_enums(&criteria(&[("art", "PKW")])));
        assert!(check_enums(&criteria(&[("art", "LKW")])));
        assert!(check_enums(&criteria(&[("marke", "BMW")])));
        assert!(!check_enums(&criteria(&[("art", "SUV")])));
    }
}
