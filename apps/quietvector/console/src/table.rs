/// Placeholder for values the server did not report.
pub const MISSING: &str = "-";

/// Left-aligned plain-text table with a header rule.
pub fn render(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let header: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();

    let mut out = vec![line(&header), line(&rule)];
    out.extend(rows.iter().map(|row| line(row)));
    out.join("\n")
}

pub fn or_missing<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_are_padded() {
        let table = render(
            &["name", "points"],
            &[
                vec!["docs".to_string(), "3".to_string()],
                vec!["images".to_string(), "120".to_string()],
            ],
        );
        assert_eq!(
            table,
            "name    points\n------  ------\ndocs    3\nimages  120"
        );
    }

    #[test]
    fn test_or_missing() {
        assert_eq!(or_missing(Some(5)), "5");
        assert_eq!(or_missing(None::<u64>), "-");
    }
}
