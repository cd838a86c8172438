use crate::page::RawPage;
use crate::record::Record;

/// Collapse whitespace runs (including newlines) to one space and trim.
pub fn normalize_cell(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for word in raw.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Turn a raw page into records.
///
/// - every cell and header is whitespace-normalized;
/// - blank headers, and cells beyond the header list, are named `column_{i}`;
/// - short rows are padded with empty strings;
/// - rows with no visible content are dropped.
pub fn normalize_page(page: &RawPage) -> Vec<Record> {
    let headers: Vec<String> = page
        .headers
        .iter()
        .enumerate()
        .map(|(i, h)| column_name(i, Some(h)))
        .collect();

    page.rows
        .iter()
        .map(|row| {
            let width = headers.len().max(row.len());
            let fields = (0..width)
                .map(|i| {
                    let name = headers
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| column_name(i, None));
                    let value = match row.get(i) {
                        Some(Some(cell)) => Some(normalize_cell(cell)),
                        Some(None) => None,
                        None => Some(String::new()),
                    };
                    (name, value)
                })
                .collect();
            Record::new(fields)
        })
        .filter(|record| !record.is_blank())
        .collect()
}

fn column_name(index: usize, header: Option<&String>) -> String {
    match header.map(|h| normalize_cell(h)) {
        Some(name) if !name.is_empty() => name,
        _ => format!("column_{index}"),
    }
}
