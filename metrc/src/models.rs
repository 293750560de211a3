//! Resource payloads exchanged with the Metrc REST API.
//!
//! Metrc uses PascalCase JSON keys. `*Post` types are request bodies for
//! create/update; the plain types are what the listing and by-id endpoints
//! return. Response records keep unmodelled fields in `extra` so a fetched
//! record can be echoed back verbatim.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body element for `locations/v1/create` and `locations/v1/update`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct LocationPost {
    /// Required by update, absent on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub location_type_name: String,
}

/// Location as returned by `locations/v1/active` and `locations/v1/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Location {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub location_type_name: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Strain body and record; Metrc uses the same shape in both directions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Strain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub testing_status: String,
    #[serde(default)]
    pub thc_level: Option<f64>,
    #[serde(default)]
    pub cbd_level: Option<f64>,
    #[serde(default)]
    pub indica_percentage: Option<f64>,
    #[serde(default)]
    pub sativa_percentage: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Body element for `items/v1/create` and `items/v1/update`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ItemPost {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub item_category: String,
    pub name: String,
    pub unit_of_measure: String,
    pub strain: String,
    pub unit_thc_content: f64,
    pub unit_thc_content_unit_of_measure: String,
    pub unit_thc_content_dose: f64,
    pub unit_thc_content_dose_unit_of_measure: String,
    pub unit_weight: f64,
    pub unit_weight_unit_of_measure: String,
    pub number_of_doses: u32,
}

/// Item as returned by `items/v1/active` and `items/v1/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Item {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub product_category_name: Option<String>,
    #[serde(default)]
    pub unit_of_measure_name: Option<String>,
    #[serde(default)]
    pub strain_name: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Anything the active listings can be searched in by name.
pub trait Named {
    fn id(&self) -> i64;
    fn name(&self) -> &str;
}

impl Named for Location {
    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Strain {
    fn id(&self) -> i64 {
        self.id.unwrap_or_default()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Item {
    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_post_omits_missing_id() {
        let post = LocationPost {
            id: None,
            name: "Vault".to_string(),
            location_type_name: "Default Location type".to_string(),
        };
        let json = serde_json::to_value(&post).expect("encode");
        assert_eq!(
            json,
            serde_json::json!({"Name": "Vault", "LocationTypeName": "Default Location type"})
        );
    }

    #[test]
    fn location_keeps_unmodelled_fields() {
        let raw = r#"{"Id":7,"Name":"Vault","LocationTypeId":3,"ForPlants":false}"#;
        let location: Location = serde_json::from_str(raw).expect("decode");
        assert_eq!(location.id, 7);
        assert_eq!(location.location_type_name, None);
        assert_eq!(location.extra.get("LocationTypeId"), Some(&Value::from(3)));

        let back = serde_json::to_value(&location).expect("encode");
        assert_eq!(back["ForPlants"], Value::Bool(false));
    }

    #[test]
    fn item_post_uses_pascal_case_keys() {
        let post = ItemPost {
            id: Some(9),
            unit_thc_content_dose_unit_of_measure: "Milligrams".to_string(),
            number_of_doses: 2,
            ..ItemPost::default()
        };
        let json = serde_json::to_value(&post).expect("encode");
        assert_eq!(json["Id"], Value::from(9));
        assert_eq!(json["UnitThcContentDoseUnitOfMeasure"], "Milligrams");
        assert_eq!(json["NumberOfDoses"], Value::from(2));
    }

    #[test]
    fn strain_without_id_reports_zero() {
        let strain: Strain = serde_json::from_str(r#"{"Name":"Kush"}"#).expect("decode");
        assert_eq!(Named::id(&strain), 0);
        assert_eq!(Named::name(&strain), "Kush");
    }
}
