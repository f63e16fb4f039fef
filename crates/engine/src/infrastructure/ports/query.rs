//! Paths, queries, cursors and write batches understood by the document store.
//!
//! Query evaluation lives here rather than in an adapter so every backend
//! (and every test) agrees on filter matching, sort order and cursor
//! anchoring.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use townsquare_domain::DocumentId;

use super::error::StoreError;

/// Document body. Nested maps are addressed with dotted paths
/// (`reactionCounts.heart`).
pub type Fields = Map<String, Value>;

// =============================================================================
// Paths
// =============================================================================

/// Slash-separated collection path: `threads` or `threads/{id}/comments`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn root(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Sub-collection under a document.
    pub fn child(parent: &DocumentRef, name: &str) -> Self {
        Self(format!("{}/{}/{}", parent.collection, parent.id, name))
    }

    pub fn doc(&self, id: DocumentId) -> DocumentRef {
        DocumentRef::new(self.clone(), id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    pub collection: CollectionPath,
    pub id: DocumentId,
}

impl DocumentRef {
    pub fn new(collection: CollectionPath, id: DocumentId) -> Self {
        Self { collection, id }
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

// =============================================================================
// Documents
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: DocumentId, fields: Fields) -> Self {
        Self { id, fields }
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        field_at(&self.fields, path)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn get_i64(&self, path: &str) -> Option<i64> {
        self.get(path).and_then(Value::as_i64)
    }
}

/// Resolve a dotted path inside nested maps.
pub fn field_at<'a>(fields: &'a Fields, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = fields.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Write a value at a dotted path, creating intermediate maps and replacing
/// any non-map value found on the way.
pub fn set_field_at(fields: &mut Fields, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            fields.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = fields
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(inner) = entry {
                set_field_at(inner, rest, value);
            }
        }
    }
}

/// Total order over field values: null < bool < number < string. Arrays and
/// maps sort last and compare equal among themselves.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => {
                let x = x.as_f64().unwrap_or(0.0);
                let y = y.as_f64().unwrap_or(0.0);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

// =============================================================================
// Queries
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FieldFilter {
    Eq { field: String, value: Value },
    ArrayContains { field: String, value: Value },
    Gte { field: String, value: Value },
}

impl FieldFilter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn array_contains(field: &str, value: impl Into<Value>) -> Self {
        Self::ArrayContains {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn gte(field: &str, value: impl Into<Value>) -> Self {
        Self::Gte {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        match self {
            FieldFilter::Eq { field, value } => field_at(fields, field) == Some(value),
            FieldFilter::ArrayContains { field, value } => field_at(fields, field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(value)),
            FieldFilter::Gte { field, value } => field_at(fields, field).is_some_and(|actual| {
                std::mem::discriminant(actual) == std::mem::discriminant(value)
                    && compare_values(actual, value) != Ordering::Less
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A filtered, ordered query over one collection.
///
/// Documents that lack an ordered field are excluded from results, the
/// same way managed stores drop documents missing an `orderBy` field.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreQuery {
    pub collection: CollectionPath,
    pub filters: Vec<FieldFilter>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<usize>,
}

impl StoreQuery {
    pub fn new(collection: CollectionPath) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
        }
    }

    pub fn filter(mut self, filter: FieldFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by.push(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Stable identity of the query ignoring its limit. Two queries with the
    /// same shape can share cursors.
    pub fn shape_key(&self) -> String {
        let filters = serde_json::to_string(&self.filters).unwrap_or_default();
        let order = serde_json::to_string(&self.order_by).unwrap_or_default();
        format!("{}|{}|{}", self.collection, filters, order)
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.order_by
            .iter()
            .all(|order| doc.get(&order.field).is_some())
            && self.filters.iter().all(|f| f.matches(&doc.fields))
    }

    fn sort_key(&self, doc: &Document) -> Vec<Value> {
        self.order_by
            .iter()
            .map(|order| doc.get(&order.field).cloned().unwrap_or(Value::Null))
            .collect()
    }

    fn compare_keys(&self, a: (&[Value], &str), b: (&[Value], &str)) -> Ordering {
        for (idx, order) in self.order_by.iter().enumerate() {
            let null = Value::Null;
            let left = a.0.get(idx).unwrap_or(&null);
            let right = b.0.get(idx).unwrap_or(&null);
            let ord = match order.direction {
                Direction::Asc => compare_values(left, right),
                Direction::Desc => compare_values(right, left),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        // Ties break on document id, in the direction of the last ordering.
        match self.order_by.last().map(|o| o.direction) {
            Some(Direction::Desc) => b.1.cmp(a.1),
            _ => a.1.cmp(b.1),
        }
    }

    /// Result order of two documents under this query.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let ka = self.sort_key(a);
        let kb = self.sort_key(b);
        self.compare_keys((&ka, a.id.as_str()), (&kb, b.id.as_str()))
    }

    /// Cursor anchored on `doc`; a query resumed from it starts strictly
    /// after `doc`.
    pub fn cursor_after(&self, doc: &Document) -> Cursor {
        Cursor {
            shape: self.shape_key(),
            anchor: self.sort_key(doc),
            id: doc.id.as_str().to_string(),
        }
    }

    /// Validate that `cursor` belongs to this query.
    pub fn check_cursor(&self, cursor: &Cursor) -> Result<(), StoreError> {
        if cursor.shape == self.shape_key() && cursor.anchor.len() == self.order_by.len() {
            Ok(())
        } else {
            Err(StoreError::CursorMismatch)
        }
    }

    /// True when `doc` sorts strictly after the cursor anchor.
    pub fn is_after(&self, doc: &Document, cursor: &Cursor) -> bool {
        let key = self.sort_key(doc);
        self.compare_keys((&key, doc.id.as_str()), (&cursor.anchor, &cursor.id))
            == Ordering::Greater
    }

    /// Filter, sort, skip past `after` and apply the limit.
    pub fn evaluate(
        &self,
        docs: impl IntoIterator<Item = Document>,
        after: Option<&Cursor>,
    ) -> Vec<Document> {
        let mut matched: Vec<Document> = docs
            .into_iter()
            .filter(|doc| self.matches(doc))
            .filter(|doc| match after {
                Some(cursor) => self.is_after(doc, cursor),
                None => true,
            })
            .collect();
        matched.sort_by(|a, b| self.compare(a, b));
        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }
}

// =============================================================================
// Cursors
// =============================================================================

/// Opaque position in a query's result order.
///
/// Carries the sort values of the anchor document plus the shape of the
/// query that produced it, so a cursor cannot be replayed against a
/// different filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    shape: String,
    anchor: Vec<Value>,
    id: String,
}

impl Cursor {
    /// Encode for transport (hex of the JSON form).
    pub fn to_token(&self) -> String {
        hex::encode(serde_json::to_vec(self).unwrap_or_default())
    }

    pub fn from_token(token: &str) -> Result<Self, StoreError> {
        let bytes =
            hex::decode(token.trim()).map_err(|e| StoreError::InvalidCursor(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::InvalidCursor(e.to_string()))
    }

    /// Id of the anchor document.
    pub fn document_id(&self) -> &str {
        &self.id
    }
}

// =============================================================================
// Write batches
// =============================================================================

/// Condition checked atomically before a batch is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Precondition {
    Exists(DocumentRef),
    Absent(DocumentRef),
    /// The field holds exactly `value`; `None` means the field (or the whole
    /// document) is missing.
    FieldEquals {
        doc: DocumentRef,
        field: String,
        value: Option<Value>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set {
        doc: DocumentRef,
        fields: Fields,
        merge: bool,
    },
    Update {
        doc: DocumentRef,
        fields: Fields,
    },
    Delete(DocumentRef),
    Increment {
        doc: DocumentRef,
        field: String,
        delta: i64,
    },
}

/// All-or-nothing group of writes guarded by preconditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    pub preconditions: Vec<Precondition>,
    pub writes: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(mut self, precondition: Precondition) -> Self {
        self.preconditions.push(precondition);
        self
    }

    pub fn set(mut self, doc: DocumentRef, fields: Fields) -> Self {
        self.writes.push(WriteOp::Set {
            doc,
            fields,
            merge: false,
        });
        self
    }

    pub fn merge(mut self, doc: DocumentRef, fields: Fields) -> Self {
        self.writes.push(WriteOp::Set {
            doc,
            fields,
            merge: true,
        });
        self
    }

    pub fn update(mut self, doc: DocumentRef, fields: Fields) -> Self {
        self.writes.push(WriteOp::Update { doc, fields });
        self
    }

    pub fn delete(mut self, doc: DocumentRef) -> Self {
        self.writes.push(WriteOp::Delete(doc));
        self
    }

    pub fn increment(mut self, doc: DocumentRef, field: &str, delta: i64) -> Self {
        self.writes.push(WriteOp::Increment {
            doc,
            field: field.to_string(),
            delta,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}
