//! Search request and response types
//!
//! - SearchRequest: algorithm id, field selection, filters, ordering, paging
//! - SearchResponse: tabular projection (id column + selected fields)
//! - EntitySearchResponse: typed entity list
//!
//! Algorithm ids are case-insensitive. A request without an id runs the
//! repository's default algorithm.

use serde::{Deserialize, Serialize};

/// Label of the synthetic first column holding the entity id
pub const ID_FIELD: &str = "_";

// ============================================================================
// Filters
// ============================================================================

/// Comparison applied by a [`SearchFilter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Property equals the value
    Eq,
    /// Property is absent or differs from the value
    Ne,
    /// Property contains the value as a substring
    Contains,
    /// Property starts with the value
    StartsWith,
}

/// Predicate over one searchable property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Property name
    pub field: String,
    /// Comparison
    pub op: FilterOp,
    /// Operand
    pub value: String,
}

impl SearchFilter {
    /// Create a new filter
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<String>) -> Self {
        SearchFilter {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Evaluate the filter against a property value (None = property absent)
    pub fn matches(&self, candidate: Option<&str>) -> bool {
        match (self.op, candidate) {
            (FilterOp::Ne, None) => true,
            (_, None) => false,
            (FilterOp::Eq, Some(v)) => v == self.value,
            (FilterOp::Ne, Some(v)) => v != self.value,
            (FilterOp::Contains, Some(v)) => v.contains(&self.value),
            (FilterOp::StartsWith, Some(v)) => v.starts_with(&self.value),
        }
    }
}

/// Sort direction for [`OrderBy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Smallest first
    #[default]
    Ascending,
    /// Largest first
    Descending,
}

/// Ordering by one searchable property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Property name
    pub field: String,
    /// Direction
    #[serde(default)]
    pub direction: SortDirection,
}

// ============================================================================
// SearchRequest
// ============================================================================

/// Search request executed by a named algorithm
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Algorithm id (case-insensitive); None selects the default algorithm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Fields projected into the tabular response, in order
    #[serde(default)]
    pub select: Vec<String>,
    /// Property predicates, all of which must match
    #[serde(default)]
    pub filters: Vec<SearchFilter>,
    /// Optional ordering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,
    /// Number of matches to skip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<usize>,
    /// Maximum number of matches to return
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<usize>,
}

impl SearchRequest {
    /// Request for the default algorithm with no selection
    pub fn new() -> Self {
        SearchRequest::default()
    }

    /// Request for a named algorithm
    pub fn with_id(id: impl Into<String>) -> Self {
        SearchRequest {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// Set the projected fields
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Add a property filter
    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<String>) -> Self {
        self.filters.push(SearchFilter::new(field, op, value));
        self
    }

    /// Order by a property
    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Set the number of matches to skip
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Set the maximum number of matches
    pub fn top(mut self, top: usize) -> Self {
        self.top = Some(top);
        self
    }

    /// Effective skip (0 when unset)
    #[inline]
    pub fn skip_value(&self) -> usize {
        self.skip.unwrap_or(0)
    }

    /// Effective top (None = unbounded)
    #[inline]
    pub fn top_value(&self) -> Option<usize> {
        self.top
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Column descriptor in a tabular [`SearchResponse`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMetadata {
    /// Column position
    pub index: usize,
    /// Column name
    pub name: String,
}

/// Tabular search response
///
/// Column 0 is always [`ID_FIELD`] holding the entity id; the remaining
/// columns mirror the request's `select` list in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Column descriptors
    pub fields: Vec<FieldMetadata>,
    /// One row per match; absent properties are None
    pub data: Vec<Vec<Option<String>>>,
    /// Repository ETag at the time of the search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Skip applied
    pub skip: usize,
    /// Top applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<usize>,
}

impl SearchResponse {
    /// Empty response with columns laid out for the request
    pub fn for_request(rq: &SearchRequest) -> Self {
        let fields = std::iter::once(ID_FIELD.to_string())
            .chain(rq.select.iter().cloned())
            .enumerate()
            .map(|(index, name)| FieldMetadata { index, name })
            .collect();

        SearchResponse {
            fields,
            ..Default::default()
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when no rows matched
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Typed search response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySearchResponse<E> {
    /// Matching entities in algorithm order
    pub data: Vec<E>,
    /// Repository ETag at the time of the search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Skip applied
    pub skip: usize,
    /// Top applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<usize>,
}

impl<E> Default for EntitySearchResponse<E> {
    fn default() -> Self {
        EntitySearchResponse {
            data: Vec::new(),
            etag: None,
            skip: 0,
            top: None,
        }
    }
}
