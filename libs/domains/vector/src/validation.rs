//! Field checks shared by insert and search requests.

use std::borrow::Cow;
use validator::ValidationError;

use crate::models::InsertVectorsRequest;

pub const MAX_VECTOR_DIMENSION: usize = 4096;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

#[allow(clippy::ptr_arg)]
pub fn validate_vector(vector: &Vec<f32>) -> Result<(), ValidationError> {
    if vector.is_empty() {
        return Err(error("vector_empty", "Vector cannot be empty"));
    }
    if vector.iter().any(|v| v.is_nan()) {
        return Err(error("vector_nan", "Vector contains NaN"));
    }
    if vector.iter().any(|v| v.is_infinite()) {
        return Err(error("vector_inf", "Vector contains Inf"));
    }
    if vector.len() > MAX_VECTOR_DIMENSION {
        return Err(error("vector_dimension", "Vector dimension too large"));
    }
    Ok(())
}

pub fn validate_payload(payload: &serde_json::Value) -> Result<(), ValidationError> {
    if payload.is_object() {
        Ok(())
    } else {
        Err(error("payload_type", "Payload must be a dictionary"))
    }
}

/// Every point must have the first point's dimension.
pub fn validate_point_dimensions(request: &InsertVectorsRequest) -> Result<(), ValidationError> {
    let Some(first) = request.points.first() else {
        return Ok(());
    };
    let expected = first.vector.len();
    if request.points.iter().any(|p| p.vector.len() != expected) {
        return Err(error("dimension_mismatch", "Dimension mismatch"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Point, PointId};
    use serde_json::json;
    use validator::Validate;

    fn message(err: ValidationError) -> String {
        err.message.map(|m| m.to_string()).unwrap_or_default()
    }

    #[test]
    fn test_vector_rules() {
        assert_eq!(message(validate_vector(&vec![]).unwrap_err()), "Vector cannot be empty");
        assert_eq!(
            message(validate_vector(&vec![1.0, f32::NAN]).unwrap_err()),
            "Vector contains NaN"
        );
        assert_eq!(
            message(validate_vector(&vec![f32::INFINITY]).unwrap_err()),
            "Vector contains Inf"
        );
        assert_eq!(
            message(validate_vector(&vec![1.0; 5000]).unwrap_err()),
            "Vector dimension too large"
        );
        assert!(validate_vector(&vec![1.0; MAX_VECTOR_DIMENSION]).is_ok());
    }

    #[test]
    fn test_payload_must_be_object() {
        assert!(validate_payload(&json!({"k": "v"})).is_ok());
        assert_eq!(
            message(validate_payload(&json!("invalid")).unwrap_err()),
            "Payload must be a dictionary"
        );
    }

    fn point(id: u64, dim: usize) -> Point {
        Point {
            id: PointId::Num(id),
            vector: vec![0.5; dim],
            payload: None,
        }
    }

    #[test]
    fn test_insert_request_dimension_mismatch() {
        let request = InsertVectorsRequest {
            collection: "test".into(),
            points: vec![point(1, 3), point(2, 4)],
        };
        let errors = request.validate().unwrap_err();
        let details = axum_helpers::errors::validation_details(&errors);
        assert_eq!(details["__all__"][0]["message"], "Dimension mismatch");
    }

    #[test]
    fn test_insert_request_nested_point_errors() {
        let mut bad = point(2, 2);
        bad.payload = Some(json!([1, 2]));
        let request = InsertVectorsRequest {
            collection: "test".into(),
            points: vec![point(1, 2), bad],
        };
        let errors = request.validate().unwrap_err();
        let details = axum_helpers::errors::validation_details(&errors);
        assert_eq!(
            details["points[1].payload"][0]["message"],
            "Payload must be a dictionary"
        );
    }

    #[test]
    fn test_insert_request_consistent_dimensions() {
        let request = InsertVectorsRequest {
            collection: "test".into(),
            points: vec![point(1, 3), point(2, 3), point(3, 3)],
        };
        assert!(request.validate().is_ok());
    }
}
