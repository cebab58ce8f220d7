//! Acceso a filas para el aggregate Vehicle
//!
//! Este módulo ejecuta las consultas del QueryBuilder, define los structs
//! de fila y el mapeo explícito fila ↔ dominio. Las escrituras que tocan
//! varias tablas corren dentro de una transacción.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::criteria::SearchCriteria;
use crate::models::engine::Engine;
use crate::models::pageable::Pageable;
use crate::models::repair::Repair;
use crate::models::vehicle::{Vehicle, VehicleArt};
use crate::models::vehicle_file::AttachedFile;
use crate::repositories::query_builder::QueryBuilder;
use crate::utils::errors::AppResult;

/// Fila de vehicle + engine (INNER JOIN, sin reparaciones)
#[derive(Debug, sqlx::FromRow)]
pub struct VehicleMotorRow {
    pub id: Uuid,
    pub version: i32,
    pub fahrgestellnummer: String,
    pub marke: String,
    pub modell: String,
    pub baujahr: Option<i32>,
    pub art: Option<String>,
    pub preis: Decimal,
    pub sicherheitsmerkmale: Option<String>,
    pub erzeugt: DateTime<Utc>,
    pub aktualisiert: DateTime<Utc>,
    pub motor_id: Uuid,
    pub motor_name: String,
    pub motor_ps: Option<i32>,
    pub motor_zylinder: Option<i32>,
    pub motor_drehzahl: Option<Decimal>,
}

/// Fila de vehicle + engine + repair (LEFT JOIN, columnas de repair anulables)
#[derive(Debug, sqlx::FromRow)]
pub struct VehicleDetailRow {
    #[sqlx(flatten)]
    pub vehicle: VehicleMotorRow,
    pub reperatur_id: Option<Uuid>,
    pub reperatur_kosten: Option<Decimal>,
    pub reperatur_mechaniker: Option<String>,
    pub reperatur_datum: Option<NaiveDate>,
}

impl VehicleDetailRow {
    /// Reparación de la fila, si el LEFT JOIN produjo una.
    fn repair(&self) -> Option<Repair> {
        match (self.reperatur_id, &self.reperatur_mechaniker) {
            (Some(id), Some(mechaniker)) => Some(Repair {
                id,
                kosten: self.reperatur_kosten,
                mechaniker: mechaniker.clone(),
                datum: self.reperatur_datum,
            }),
            _ => None,
        }
    }
}

/// Mapeo explícito fila → dominio. La columna sicherheitsmerkmale guarda
/// los tags como string delimitado por comas; NULL se materializa como
/// secuencia vacía, nunca como ausencia.
fn to_vehicle(row: VehicleMotorRow) -> Vehicle {
    Vehicle {
        id: row.id,
        version: row.version,
        fahrgestellnummer: row.fahrgestellnummer,
        marke: row.marke,
        modell: row.modell,
        baujahr: row.baujahr,
        art: row.art.as_deref().and_then(VehicleArt::parse),
        preis: row.preis,
        sicherheitsmerkmale: split_merkmale(row.sicherheitsmerkmale),
        motor: Engine {
            id: row.motor_id,
            name: row.motor_name,
            ps: row.motor_ps,
            zylinder: row.motor_zylinder,
            drehzahl: row.motor_drehzahl,
        },
        reperaturen: Vec::new(),
        erzeugt: row.erzeugt,
        aktualisiert: row.aktualisiert,
    }
}

fn split_merkmale(column: Option<String>) -> Vec<String> {
    column
        .map(|value| {
            value
                .split(',')
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn join_merkmale(merkmale: &[String]) -> Option<String> {
    if merkmale.is_empty() {
        None
    } else {
        Some(merkmale.join(","))
    }
}

/// Plegar las filas del LEFT JOIN a un único aggregate con sus reparaciones.
fn fold_detail_rows(rows: Vec<VehicleDetailRow>) -> Option<Vehicle> {
    let mut rows = rows.into_iter();
    let first = rows.next()?;
    let first_repair = first.repair();
    let mut vehicle = to_vehicle(first.vehicle);
    vehicle.reperaturen.extend(first_repair);
    for row in rows {
        vehicle.reperaturen.extend(row.repair());
    }
    Some(vehicle)
}

pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(
        &self,
        id: Uuid,
        mit_reperaturen: bool,
    ) -> AppResult<Option<Vehicle>> {
        if mit_reperaturen {
            let mut builder = QueryBuilder::build_id(id, true);
            let rows: Vec<VehicleDetailRow> =
                builder.build_query_as().fetch_all(&self.pool).await?;
            Ok(fold_detail_rows(rows))
        } else {
            let mut builder = QueryBuilder::build_id(id, false);
            let row: Option<VehicleMotorRow> =
                builder.build_query_as().fetch_optional(&self.pool).await?;
            Ok(row.map(to_vehicle))
        }
    }

    pub async fn find(
        &self,
        criteria: &SearchCriteria,
        pageable: &Pageable,
    ) -> AppResult<Vec<Vehicle>> {
        let mut builder = QueryBuilder::build(criteria, pageable);
        let rows: Vec<VehicleMotorRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(to_vehicle).collect())
    }

    pub async fn count(&self, criteria: &SearchCriteria) -> AppResult<i64> {
        let mut builder = QueryBuilder::build_count(criteria);
        let total: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total)
    }

    pub async fn fahrgestellnummer_exists(&self, fahrgestellnummer: &str) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM vehicle WHERE fahrgestellnummer = $1)",
        )
        .bind(fahrgestellnummer)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    /// Persistir el aggregate completo: vehicle, engine y repairs en una
    /// única transacción.
    pub async fn insert(&self, vehicle: &Vehicle) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO vehicle (id, version, fahrgestellnummer, marke, modell, baujahr, art, preis, sicherheitsmerkmale, erzeugt, aktualisiert)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(vehicle.id)
        .bind(vehicle.version)
        .bind(&vehicle.fahrgestellnummer)
        .bind(&vehicle.marke)
        .bind(&vehicle.modell)
        .bind(vehicle.baujahr)
        .bind(vehicle.art.map(|art| art.as_str()))
        .bind(vehicle.preis)
        .bind(join_merkmale(&vehicle.sicherheitsmerkmale))
        .bind(vehicle.erzeugt)
        .bind(vehicle.aktualisiert)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO engine (id, name, ps, zylinder, drehzahl, vehicle_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(vehicle.motor.id)
        .bind(&vehicle.motor.name)
        .bind(vehicle.motor.ps)
        .bind(vehicle.motor.zylinder)
        .bind(vehicle.motor.drehzahl)
        .bind(vehicle.id)
        .execute(&mut *tx)
        .await?;

        for repair in &vehicle.reperaturen {
            sqlx::query(
                r#"
                INSERT INTO repair (id, kosten, mechaniker, datum, vehicle_id)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(repair.id)
            .bind(repair.kosten)
            .bind(&repair.mechaniker)
            .bind(repair.datum)
            .bind(vehicle.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Actualizar los escalares ya mergeados; el store incrementa la
    /// versión en uno y la devuelve.
    pub async fn update(&self, vehicle: &Vehicle) -> AppResult<i32> {
        let version: i32 = sqlx::query_scalar(
            r#"
            UPDATE vehicle
            SET marke = $2, modell = $3, baujahr = $4, art = $5, preis = $6,
                sicherheitsmerkmale = $7, version = version + 1, aktualisiert = $8
            WHERE id = $1
            RETURNING version
            "#,
        )
        .bind(vehicle.id)
        .bind(&vehicle.marke)
        .bind(&vehicle.modell)
        .bind(vehicle.baujahr)
        .bind(vehicle.art.map(|art| art.as_str()))
        .bind(vehicle.preis)
        .bind(join_merkmale(&vehicle.sicherheitsmerkmale))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(version)
    }

    /// Borrado en cascada explícito: primero los hijos, al final el padre,
    /// todo o nada. Devuelve true si la fila de vehicle existía.
    pub async fn delete(&self, vehicle: &Vehicle) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM engine WHERE id = $1")
            .bind(vehicle.motor.id)
            .execute(&mut *tx)
            .await?;

        for repair in &vehicle.reperaturen {
            sqlx::query("DELETE FROM repair WHERE id = $1")
                .bind(repair.id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("DELETE FROM attached_file WHERE vehicle_id = $1")
            .bind(vehicle.id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM vehicle WHERE id = $1")
            .bind(vehicle.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_file(&self, vehicle_id: Uuid) -> AppResult<Option<AttachedFile>> {
        let file = sqlx::query_as::<_, AttachedFile>(
            "SELECT id, filename, mimetype, data, vehicle_id FROM attached_file WHERE vehicle_id = $1",
        )
        .bind(vehicle_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(file)
    }

    pub async fn delete_file(&self, vehicle_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM attached_file WHERE vehicle_id = $1")
            .bind(vehicle_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn insert_file(&self, file: &AttachedFile) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO attached_file (id, filename, mimetype, data, vehicle_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(file.id)
        .bind(&file.filename)
        .bind(&file.mimetype)
        .bind(&file.data)
        .bind(file.vehicle_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn motor_row() -> VehicleMotorRow {
        VehicleMotorRow {
            id: Uuid::new_v4(),
            version: 0,
            fahrgestellnummer: "W0L000051T2123456".to_string(),
            marke: "BMW".to_string(),
            modell: "X5".to_string(),
            baujahr: Some(2021),
            art: Some("PKW".to_string()),
            preis: Decimal::from_str("49999.99").unwrap(),
            sicherheitsmerkmale: Some("ESB,ABS".to_string()),
            erzeugt: Utc::now(),
            aktualisiert: Utc::now(),
            motor_id: Uuid::new_v4(),
            motor_name: "V8".to_string(),
            motor_ps: Some(408),
            motor_zylinder: Some(8),
            motor_drehzahl: None,
        }
    }

    #[test]
    fn test_to_vehicle_splits_merkmale() {
        let vehicle = to_vehicle(motor_row());
        assert_eq!(vehicle.sicherheitsmerkmale, vec!["ESB", "ABS"]);
        assert_eq!(vehicle.art, Some(VehicleArt::Pkw));
        assert_eq!(vehicle.motor.name, "V8");
        assert!(vehicle.reperaturen.is_empty());
    }

    #[test]
    fn test_null_merkmale_become_empty_sequence() {
        let mut row = motor_row();
        row.sicherheitsmerkmale = None;
        let vehicle = to_vehicle(row);
        assert!(vehicle.sicherheitsmerkmale.is_empty());
    }

    #[test]
    fn test_join_merkmale_roundtrip() {
        assert_eq!(
            join_merkmale(&["ESB".to_string(), "ABS".to_string()]),
            Some("ESB,ABS".to_string())
        );
        assert_eq!(join_merkmale(&[]), None);
        assert_eq!(split_merkmale(join_merkmale(&[])), Vec::<String>::new());
    }

    #[test]
    fn test_fold_detail_rows_collects_repairs() {
        let base = motor_row();
        let make_detail = |mechaniker: &str| VehicleDetailRow {
            vehicle: VehicleMotorRow {
                id: base.id,
                art: base.art.clone(),
                fahrgestellnummer: base.fahrgestellnummer.clone(),
                marke: base.marke.clone(),
                modell: base.modell.clone(),
                sicherheitsmerkmale: base.sicherheitsmerkmale.clone(),
                motor_name: base.motor_name.clone(),
                ..motor_row()
            },
            reperatur_id: Some(Uuid::new_v4()),
            reperatur_kosten: Some(Decimal::from_str("78.90").unwrap()),
            reperatur_mechaniker: Some(mechaniker.to_string()),
            reperatur_datum: NaiveDate::from_ymd_opt(2024, 1, 31),
        };

        let vehicle = fold_detail_rows(vec![make_detail("Hans"), make_detail("Petra")]).unwrap();
        assert_eq!(vehicle.reperaturen.len(), 2);
        assert_eq!(vehicle.reperaturen[0].mechaniker, "Hans");
        assert_eq!(vehicle.reperaturen[1].mechaniker, "Petra");
    }

    #[test]
    fn test_fold_detail_rows_without_repairs() {
        let detail = VehicleDetailRow {
            vehicle: motor_row(),
            reperatur_id: None,
            reperatur_kosten: None,
            reperatur_mechaniker: None,
            reperatur_datum: None,
        };
        let vehicle = fold_detail_rows(vec![detail]).unwrap();
        assert!(vehicle.reperaturen.is_empty());
    }

    #[test]
    fn test_fold_detail_rows_empty() {
        assert!(fold_detail_rows(Vec::new()).is_none());
    }
}
