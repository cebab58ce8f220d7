//! Criterios de búsqueda
//!
//! Conjunto cerrado de filtros opcionales para la búsqueda de vehículos.
//! Los criterios llegan como pares clave/valor; el servicio de lectura
//! valida las claves contra `FILTER_KEYS` antes de construir la consulta.

use std::collections::BTreeMap;

/// Claves de búsqueda admitidas. Todas las demás provocan un error.
pub const FILTER_KEYS: [&str; 11] = [
    "fahrgestellnummer",
    "marke",
    "modell",
    "baujahr",
    "art",
    "preis",
    "esb",
    "abs",
    "airbag",
    "parkassistent",
    "motor",
];

/// Claves que el QueryBuilder trata de forma especial; el resto se
/// compara por igualdad contra la columna homónima de `vehicle`.
pub const SPECIAL_KEYS: [&str; 7] = [
    "motor",
    "baujahr",
    "preis",
    "esb",
    "abs",
    "airbag",
    "parkassistent",
];

/// Conjunto disperso de criterios. Un mapa vacío equivale a "buscar todo".
#[derive(Debug, Clone, Default)]
pub struct SearchCriteria {
    fields: BTreeMap<String, String>,
}

impl SearchCriteria {
    pub fn new(fields: BTreeMap<String, String>) -> Self {
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Pares clave/valor no cubiertos por los filtros especiales,
    /// en orden determinista.
    pub fn equality_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .filter(|(key, _)| !SPECIAL_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl From<BTreeMap<String, String>> for SearchCriteria {
    fn from(fields: BTreeMap<String, String>) -> Self {
        Self::new(fields)
    }
}
