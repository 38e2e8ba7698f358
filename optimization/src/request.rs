//! Schema of the optimize-tours request, decoded at the HTTP boundary.
//!
//! Only the fields the gateway relies on are typed. Everything else,
//! including the content of individual shipments and vehicles, is carried
//! through to the optimization service untouched.

use crate::errors::OptimizationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizeToursRequest {
    pub model: ShipmentModel,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShipmentModel {
    pub shipments: Vec<Value>,
    pub vehicles: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn field<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    value.get(name).filter(|v| !v.is_null())
}

impl OptimizeToursRequest {
    /// Validates required fields in order (`model`, `model.shipments`,
    /// `model.vehicles`) and decodes the request.
    pub fn from_value(value: Value) -> Result<Self, OptimizationError> {
        let model = field(&value, "model").ok_or(OptimizationError::MissingModel)?;
        field(model, "shipments").ok_or(OptimizationError::MissingShipments)?;
        field(model, "vehicles").ok_or(OptimizationError::MissingVehicles)?;

        serde_json::from_value(value).map_err(|e| OptimizationError::InvalidField(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_request_keeps_extra_fields() {
        let value = json!({
            "model": {
                "shipments": [{"label": "s1"}],
                "vehicles": [{"label": "v1"}],
                "globalStartTime": "2024-03-07T08:00:00Z"
            },
            "searchMode": "CONSUME_ALL_AVAILABLE_TIME",
            "timeout": "30s"
        });

        let request = OptimizeToursRequest::from_value(value.clone()).unwrap();
        assert_eq!(request.model.shipments.len(), 1);
        assert_eq!(request.model.vehicles.len(), 1);
        assert_eq!(request.extra["timeout"], "30s");
        assert_eq!(
            request.model.extra["globalStartTime"],
            "2024-03-07T08:00:00Z"
        );

        // Serializing produces the original document
        assert_eq!(serde_json::to_value(&request).unwrap(), value);
    }

    #[test]
    fn test_missing_fields_in_order() {
        assert_eq!(
            OptimizeToursRequest::from_value(json!({})).unwrap_err(),
            OptimizationError::MissingModel
        );
        assert_eq!(
            OptimizeToursRequest::from_value(json!({"model": null})).unwrap_err(),
            OptimizationError::MissingModel
        );
        assert_eq!(
            OptimizeToursRequest::from_value(json!([1, 2])).unwrap_err(),
            OptimizationError::MissingModel
        );
        // shipments is checked before vehicles
        assert_eq!(
            OptimizeToursRequest::from_value(json!({"model": {}})).unwrap_err(),
            OptimizationError::MissingShipments
        );
        assert_eq!(
            OptimizeToursRequest::from_value(json!({"model": {"shipments": []}})).unwrap_err(),
            OptimizationError::MissingVehicles
        );
    }

    #[test]
    fn test_empty_collections_are_present() {
        let request =
            OptimizeToursRequest::from_value(json!({"model": {"shipments": [], "vehicles": []}}))
                .unwrap();
        assert!(request.model.shipments.is_empty());
        assert!(request.extra.is_empty());
    }

    #[test]
    fn test_wrong_shape_is_field_error() {
        let err = OptimizeToursRequest::from_value(json!({
            "model": {"shipments": "none", "vehicles": []}
        }))
        .unwrap_err();

        match err {
            OptimizationError::InvalidField(detail) => assert!(detail.contains("invalid type")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
