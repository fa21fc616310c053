//! Property scan search
//!
//! Full scan over a snapshot evaluating property filters, with optional
//! ordering and skip/top paging. Without ordering the hits are produced
//! lazily; ordering has to materialize the matches first.

use std::cmp::Ordering;

use memrepo_core::{EntityKey, SearchFilter, SearchRequest, SortDirection};
use memrepo_storage::IndexSnapshot;

use crate::algorithm::{SearchAlgorithm, SearchError, SearchHit, SearchHits};

/// Default id of [`PropertyScanSearch`]
pub const SCAN_SEARCH_ID: &str = "scan";

/// Filter/order/page scan over searchable properties
#[derive(Debug, Clone)]
pub struct PropertyScanSearch {
    id: String,
}

impl PropertyScanSearch {
    /// Scan registered as `"scan"`
    pub fn new() -> Self {
        PropertyScanSearch {
            id: SCAN_SEARCH_ID.to_string(),
        }
    }

    /// Scan registered under a custom id
    pub fn with_id(id: impl Into<String>) -> Self {
        PropertyScanSearch { id: id.into() }
    }
}

impl Default for PropertyScanSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: EntityKey, E: 'static> SearchAlgorithm<K, E> for PropertyScanSearch {
    fn id(&self) -> &str {
        &self.id
    }

    fn search<'a>(
        &self,
        snapshot: &'a IndexSnapshot<K, E>,
        request: &SearchRequest,
    ) -> Result<SearchHits<'a, K, E>, SearchError> {
        if let Some(f) = request.filters.iter().find(|f| f.field.is_empty()) {
            return Err(SearchError::InvalidRequest(format!(
                "filter on empty field name (value '{}')",
                f.value
            )));
        }

        let filters: Vec<SearchFilter> = request.filters.clone();
        let matches = snapshot
            .iter()
            .filter(move |c| filters.iter().all(|f| f.matches(c.property(&f.field))))
            .map(|c| SearchHit::new(c.clone()));

        let skip = request.skip_value();
        let top = request.top_value().unwrap_or(usize::MAX);

        match &request.order_by {
            None => Ok(Box::new(matches.skip(skip).take(top))),
            Some(order) => {
                let mut hits: Vec<_> = matches.collect();
                let field = order.field.as_str();
                let descending = order.direction == SortDirection::Descending;
                hits.sort_by(|a, b| {
                    let ord = compare_property(a.property(field), b.property(field));
                    if descending {
                        ord.reverse()
                    } else {
                        ord
                    }
                });
                Ok(Box::new(hits.into_iter().skip(skip).take(top)))
            }
        }
    }
}

enum SortKey<'a> {
    Absent,
    Number(f64),
    Text(&'a str),
}

impl<'a> SortKey<'a> {
    fn of(value: Option<&'a str>) -> Self {
        match value {
            None => SortKey::Absent,
            Some(v) => v.parse::<f64>().map_or(SortKey::Text(v), SortKey::Number),
        }
    }
}

/// Total order over property values: absent first, then numbers (by
/// `f64::total_cmp`), then everything else lexically.
fn compare_property(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (SortKey::of(a), SortKey::of(b)) {
        (SortKey::Absent, SortKey::Absent) => Ordering::Equal,
        (SortKey::Absent, _) => Ordering::Less,
        (_, SortKey::Absent) => Ordering::Greater,
        (SortKey::Number(x), SortKey::Number(y)) => x.total_cmp(&y),
        (SortKey::Number(_), SortKey::Text(_)) => Ordering::Less,
        (SortKey::Text(_), SortKey::Number(_)) => Ordering::Greater,
        (SortKey::Text(x), SortKey::Text(y)) => x.cmp(y),
    }
}
