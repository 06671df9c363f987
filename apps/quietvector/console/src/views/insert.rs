use domain_vector::Point;
use domain_vector::models::InsertVectorsRequest;
use std::path::Path;

use crate::client::ApiClient;
use crate::error::{ConsoleError, ConsoleResult};

/// Points text from `--file` (preferred) or inline `--json`.
pub async fn load_text(file: Option<&Path>, json: Option<&str>) -> ConsoleResult<String> {
    match (file, json) {
        (Some(file), _) => Ok(tokio::fs::read_to_string(file).await?),
        (None, Some(json)) => Ok(json.to_string()),
        (None, None) => Err(ConsoleError::input("provide --file or --json")),
    }
}

/// Parse a non-empty JSON array of points sharing one dimension.
pub fn parse_points(text: &str) -> ConsoleResult<Vec<Point>> {
    let points: Vec<Point> =
        serde_json::from_str(text).map_err(|_| ConsoleError::input("invalid points data"))?;
    let Some(first) = points.first() else {
        return Err(ConsoleError::input("invalid points data"));
    };

    let expected = first.vector.len();
    for (index, point) in points.iter().enumerate() {
        if point.vector.is_empty() {
            return Err(ConsoleError::input(format!("empty vector at point {index}")));
        }
        if point.vector.len() != expected {
            return Err(ConsoleError::input(format!(
                "dimension mismatch at point {index}: expected {expected}, got {}",
                point.vector.len()
            )));
        }
    }
    Ok(points)
}

pub async fn run(client: &ApiClient, collection: &str, text: &str) -> ConsoleResult<String> {
    if collection.is_empty() {
        return Err(ConsoleError::input("collection is required"));
    }
    let points = parse_points(text)?;

    let response = client
        .insert(&InsertVectorsRequest {
            collection: collection.to_string(),
            points,
        })
        .await?;
    Ok(format!("inserted: {}", response.inserted))
}
