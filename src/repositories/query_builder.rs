//! Construcción dinámica de consultas
//!
//! Este módulo traduce (criterios, paginación) a consultas SQL con bind
//! parameters. Siempre hace INNER JOIN de vehicle a engine (el motor se
//! hidrata siempre); las reparaciones solo se cargan con LEFT JOIN en la
//! búsqueda por ID. Todos los filtros activos se combinan con AND.

use sqlx::Postgres;
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

use crate::models::criteria::SearchCriteria;
use crate::models::pageable::Pageable;
use rust_decimal::Decimal;

/// Columnas de vehicle + engine para hidratar el aggregate sin reparaciones.
const SELECT_VEHICLE_MOTOR: &str = "SELECT v.id, v.version, v.fahrgestellnummer, v.marke, \
     v.modell, v.baujahr, v.art, v.preis, v.sicherheitsmerkmale, v.erzeugt, v.aktualisiert, \
     m.id AS motor_id, m.name AS motor_name, m.ps AS motor_ps, \
     m.zylinder AS motor_zylinder, m.drehzahl AS motor_drehzahl \
     FROM vehicle v INNER JOIN engine m ON m.vehicle_id = v.id";

/// Igual que arriba pero con las columnas de repair (LEFT JOIN, pueden ser NULL).
const SELECT_VEHICLE_MOTOR_REPAIRS: &str = "SELECT v.id, v.version, v.fahrgestellnummer, v.marke, \
     v.modell, v.baujahr, v.art, v.preis, v.sicherheitsmerkmale, v.erzeugt, v.aktualisiert, \
     m.id AS motor_id, m.name AS motor_name, m.ps AS motor_ps, \
     m.zylinder AS motor_zylinder, m.drehzahl AS motor_drehzahl, \
     r.id AS reperatur_id, r.kosten AS reperatur_kosten, \
     r.mechaniker AS reperatur_mechaniker, r.datum AS reperatur_datum \
     FROM vehicle v INNER JOIN engine m ON m.vehicle_id = v.id \
     LEFT JOIN repair r ON r.vehicle_id = v.id";

/// Consulta de totales antes de paginar; comparte joins y predicados.
const COUNT_VEHICLE_MOTOR: &str =
    "SELECT COUNT(*) FROM vehicle v INNER JOIN engine m ON m.vehicle_id = v.id";

/// Flags de seguridad y el tag serializado que buscan en la columna.
const MERKMAL_FLAGS: [(&str, &str); 4] = [
    ("esb", "ESB"),
    ("abs", "ABS"),
    ("airbag", "AIRBAG"),
    ("parkassistent", "PARKASSISTENT"),
];

pub struct QueryBuilder;

impl QueryBuilder {
    /// Consulta por ID, siempre con el motor; reparaciones bajo demanda.
    pub fn build_id(
        id: Uuid,
        mit_reperaturen: bool,
    ) -> sqlx::QueryBuilder<'static, Postgres> {
        let base = if mit_reperaturen {
            SELECT_VEHICLE_MOTOR_REPAIRS
        } else {
            SELECT_VEHICLE_MOTOR
        };
        let mut builder = sqlx::QueryBuilder::new(base);
        builder.push(" WHERE v.id = ");
        builder.push_bind(id);
        builder
    }

    /// Consulta de búsqueda con criterios y paginación.
    pub fn build(
        criteria: &SearchCriteria,
        pageable: &Pageable,
    ) -> sqlx::QueryBuilder<'static, Postgres> {
        debug!("build: criteria={:?}, pageable={:?}", criteria, pageable);

        let mut builder = sqlx::QueryBuilder::new(SELECT_VEHICLE_MOTOR);
        Self::push_criteria(&mut builder, criteria);
        builder.push(" ORDER BY v.id");

        if pageable.size > 0 {
            let skip = pageable.skip();
            debug!("build: take={}, skip={}", pageable.size, skip);
            builder.push(" LIMIT ");
            builder.push_bind(i64::from(pageable.size));
            builder.push(" OFFSET ");
            builder.push_bind(i64::from(skip));
        }

        debug!("build: sql={}", builder.sql());
        builder
    }

    /// Consulta de conteo con los mismos predicados, sin paginación.
    pub fn build_count(criteria: &SearchCriteria) -> sqlx::QueryBuilder<'static, Postgres> {
        let mut builder = sqlx::QueryBuilder::new(COUNT_VEHICLE_MOTOR);
        Self::push_criteria(&mut builder, criteria);
        builder
    }

    /// Acumulador conjuntivo: el primer predicado abre el WHERE, los
    /// siguientes encadenan con AND. El orden de evaluación es fijo.
    fn push_criteria(builder: &mut sqlx::QueryBuilder<'static, Postgres>, criteria: &SearchCriteria) {
        let mut first = true;
        let mut separator = |builder: &mut sqlx::QueryBuilder<'static, Postgres>| {
            if first {
                builder.push(" WHERE ");
                first = false;
            } else {
                builder.push(" AND ");
            }
        };

        // 1. Nombre del motor: substring case-insensitive (ILIKE nativo de Postgres)
        if let Some(motor) = criteria.get("motor") {
            separator(builder);
            builder.push("m.name ILIKE ");
            builder.push_bind(format!("%{}%", motor));
        }

        // 2. Baujahr: cota inferior inclusiva; valores no numéricos se ignoran
        if let Some(baujahr) = criteria.get("baujahr") {
            match baujahr.parse::<i32>() {
                Ok(baujahr) => {
                    separator(builder);
                    builder.push("v.baujahr >= ");
                    builder.push_bind(baujahr);
                }
                Err(_) => {
                    debug!("push_criteria: baujahr no numérico, filtro ignorado: {}", baujahr);
                }
            }
        }

        // 3. Preis: cota superior inclusiva; valores no numéricos se ignoran
        if let Some(preis) = criteria.get("preis") {
            match Decimal::from_str(preis) {
                Ok(preis) => {
                    separator(builder);
                    builder.push("v.preis <= ");
                    builder.push_bind(preis);
                }
                Err(_) => {
                    debug!("push_criteria: preis no numérico, filtro ignorado: {}", preis);
                }
            }
        }

        // 4. Flags de seguridad: solo el string literal "true" activa el filtro
        for (key, tag) in MERKMAL_FLAGS {
            if criteria.get(key) == Some("true") {
                separator(builder);
                builder.push(format!("v.sicherheitsmerkmale LIKE '%{}%'", tag));
            }
        }

        // 5. Resto de claves: igualdad estricta contra la columna homónima.
        //    Las claves ya pasaron la validación del servicio de lectura.
        for (key, value) in criteria.equality_entries() {
            separator(builder);
            builder.push(format!("v.{} = ", key));
            builder.push_bind(value.to_string());
        }
    }
}
