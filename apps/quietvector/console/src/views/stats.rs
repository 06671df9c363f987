use crate::client::ApiClient;
use crate::error::ConsoleResult;
use crate::table;

pub async fn show(client: &ApiClient) -> ConsoleResult<String> {
    let stats = client.stats().await?;

    let rows: Vec<Vec<String>> = stats
        .items
        .into_iter()
        .map(|item| {
            vec![
                item.name,
                item.points_count.to_string(),
                item.vectors_count.to_string(),
            ]
        })
        .collect();

    Ok(format!(
        "collections: {}\ntotal points: {}\n\n{}",
        stats.collections,
        stats.total_points,
        table::render(&["name", "points", "vectors"], &rows)
    ))
}
