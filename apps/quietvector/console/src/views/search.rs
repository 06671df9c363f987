use domain_vector::SearchRequest;

use crate::client::ApiClient;
use crate::error::{ConsoleError, ConsoleResult};
use crate::table;

pub const DEFAULT_LIMIT: u32 = 10;

/// Split on commas and keep the parts that parse as floats.
pub fn parse_vector(text: &str) -> Vec<f32> {
    text.split(',')
        .map(str::trim)
        .filter_map(|part| part.parse::<f32>().ok())
        .filter(|v| v.is_finite())
        .collect()
}

pub async fn run(
    client: &ApiClient,
    collection: &str,
    vector: &str,
    limit: u32,
    with_payload: bool,
) -> ConsoleResult<String> {
    if collection.is_empty() {
        return Err(ConsoleError::input("collection is required"));
    }
    let vector = parse_vector(vector);
    if vector.is_empty() {
        return Err(ConsoleError::input("vector has no numeric values"));
    }

    let request = SearchRequest {
        collection: collection.to_string(),
        vector,
        limit,
        with_payload,
    };
    let response = client.search(&request).await?;
    if response.results.is_empty() {
        return Ok("no results".to_string());
    }

    let rows: Vec<Vec<String>> = response
        .results
        .into_iter()
        .map(|hit| {
            vec![
                hit.id,
                format!("{:.4}", hit.score),
                hit.payload.map_or_else(|| table::MISSING.to_string(), |p| p.to_string()),
            ]
        })
        .collect();
    Ok(table::render(&["id", "score", "payload"], &rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::testing::client;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_vector_drops_non_numbers() {
        assert_eq!(parse_vector("0.1, 0.2,abc, ,3"), vec![0.1, 0.2, 3.0]);
        assert!(parse_vector("x, y").is_empty());
        assert!(parse_vector("NaN, inf").is_empty());
    }

    #[tokio::test]
    async fn test_empty_vector_rejected_locally() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = run(&client(&server), "docs", "a, b", 10, true)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "vector has no numeric values");
    }

    #[tokio::test]
    async fn test_results_table() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/vectors/search"))
            .and(body_json(json!({
                "collection": "docs",
                "vector": [0.5, 1.0],
                "limit": 3,
                "with_payload": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"id": "7", "score": 0.91234, "payload": {"k": "v"}},
                    {"id": "8", "score": 0.5, "payload": null}
                ]
            })))
            .mount(&server)
            .await;

        let out = run(&client(&server), "docs", "0.5, 1", 3, false)
            .await
            .unwrap();
        assert!(out.contains(r#"7   0.9123  {"k":"v"}"#));
        assert!(out.contains("8   0.5000  -"));
    }
}
