// Search-performance input (exported search analytics rows)

use crate::error::Result;
use crate::record::SearchPerformanceRecord;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Load a JSON array of search-performance rows.
pub fn load_search_performance(path: &Path) -> Result<Vec<SearchPerformanceRecord>> {
    let file = File::open(path)?;
    let records: Vec<SearchPerformanceRecord> = serde_json::from_reader(BufReader::new(file))?;
    info!(
        "Loaded {} search-performance rows from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

/// Keep the `limit` highest-impression rows of each source domain.
///
/// Output is grouped by domain (sorted), impressions descending within a
/// domain, ties broken by URL.
pub fn top_pages_per_domain(
    records: &[SearchPerformanceRecord],
    limit: usize,
) -> Vec<SearchPerformanceRecord> {
    let mut by_domain: BTreeMap<&str, Vec<&SearchPerformanceRecord>> = BTreeMap::new();
    for record in records {
        by_domain.entry(record.domain.as_str()).or_default().push(record);
    }

    let mut top = Vec::new();
    for (_, mut rows) in by_domain {
        rows.sort_by(|a, b| {
            b.impressions
                .cmp(&a.impressions)
                .then_with(|| a.url.cmp(&b.url))
        });
        top.extend(rows.into_iter().take(limit).cloned());
    }
    top
}
