//! Typed selector construction and the backend wire codec.
//!
//! The grammar is deliberately small: a conjunction of per-field predicates
//! (no `$or`, no nesting) and an optional single-field sort. This matches
//! what the backend's rich-query engine actually supports for this contract.

use serde_json::{json, Map, Value};

use crate::error::{QueryError, QueryResult};

/// A predicate applied to one record field.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Structural equality (`field: value` or `$eq`).
    Eq(Value),
    /// Strictly greater than (`$gt`).
    Gt(Value),
    /// Greater than or equal (`$gte`).
    Gte(Value),
    /// Strictly less than (`$lt`).
    Lt(Value),
    /// Less than or equal (`$lte`).
    Lte(Value),
    /// Regular-expression match on string fields (`$regex`).
    Regex(String),
    /// Membership in a list of values (`$in`).
    In(Vec<Value>),
}

impl Predicate {
    pub fn eq(value: impl Into<Value>) -> Self {
        Predicate::Eq(value.into())
    }

    pub fn gt(value: impl Into<Value>) -> Self {
        Predicate::Gt(value.into())
    }

    pub fn gte(value: impl Into<Value>) -> Self {
        Predicate::Gte(value.into())
    }

    pub fn lt(value: impl Into<Value>) -> Self {
        Predicate::Lt(value.into())
    }

    pub fn lte(value: impl Into<Value>) -> Self {
        Predicate::Lte(value.into())
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Predicate::Regex(pattern.into())
    }

    /// Match string fields beginning with `prefix`. The prefix is escaped,
    /// so caller input cannot smuggle regex metacharacters into the query.
    pub fn starts_with(prefix: &str) -> Self {
        Predicate::Regex(format!("^{}", regex::escape(prefix)))
    }

    pub fn in_list<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Predicate::In(values.into_iter().map(Into::into).collect())
    }

    fn wire_op(&self) -> (&'static str, Value) {
        match self {
            Predicate::Eq(v) => ("$eq", v.clone()),
            Predicate::Gt(v) => ("$gt", v.clone()),
            Predicate::Gte(v) => ("$gte", v.clone()),
            Predicate::Lt(v) => ("$lt", v.clone()),
            Predicate::Lte(v) => ("$lte", v.clone()),
            Predicate::Regex(p) => ("$regex", Value::String(p.clone())),
            Predicate::In(vs) => ("$in", Value::Array(vs.clone())),
        }
    }
}

/// Sort direction for the single sort field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn as_wire(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Sort specification: one field, one direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

/// All predicates on a single field, ANDed together.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldClause {
    pub field: String,
    pub predicates: Vec<Predicate>,
}

/// A declarative query: AND of per-field clauses plus an optional sort.
///
/// An empty selector matches every record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selector {
    clauses: Vec<FieldClause>,
    sort: Option<Sort>,
}

impl Selector {
    /// A selector matching every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Add a predicate on `field`. Repeated calls for the same field AND
    /// the predicates together within one clause.
    pub fn field(mut self, field: impl Into<String>, predicate: Predicate) -> Self {
        let field = field.into();
        match self.clauses.iter_mut().find(|c| c.field == field) {
            Some(clause) => clause.predicates.push(predicate),
            None => self.clauses.push(FieldClause {
                field,
                predicates: vec![predicate],
            }),
        }
        self
    }

    /// Set the sort field and direction, replacing any previous sort.
    pub fn sort_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some(Sort {
            field: field.into(),
            order,
        });
        self
    }

    pub fn clauses(&self) -> &[FieldClause] {
        &self.clauses
    }

    pub fn sort(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Serialize to the backend's selector JSON shape.
    ///
    /// A clause holding a single `Eq` is emitted as the bare `field: value`
    /// form; everything else uses the `$`-operator object. This keeps the
    /// output byte-shape identical to the queries the contract has always
    /// sent.
    pub fn to_wire_json(&self) -> String {
        let mut selector = Map::new();
        for clause in &self.clauses {
            let entry = match clause.predicates.as_slice() {
                [Predicate::Eq(v)] => v.clone(),
                predicates => {
                    let mut ops = Map::new();
                    for predicate in predicates {
                        let (op, value) = predicate.wire_op();
                        ops.insert(op.to_string(), value);
                    }
                    Value::Object(ops)
                }
            };
            selector.insert(clause.field.clone(), entry);
        }

        let mut root = Map::new();
        root.insert("selector".to_string(), Value::Object(selector));
        if let Some(sort) = &self.sort {
            let mut entry = Map::new();
            entry.insert(sort.field.clone(), json!(sort.order.as_wire()));
            root.insert("sort".to_string(), Value::Array(vec![Value::Object(entry)]));
        }
        Value::Object(root).to_string()
    }

    /// Parse a selector from its wire JSON form.
    ///
    /// Accepts exactly the grammar [`to_wire_json`](Self::to_wire_json)
    /// produces; unknown `$` operators and multi-field sorts are rejected.
    pub fn parse_wire(raw: &str) -> QueryResult<Self> {
        let root: Value = serde_json::from_str(raw)
            .map_err(|e| QueryError::InvalidSelector(format!("not valid JSON: {e}")))?;
        let root = root
            .as_object()
            .ok_or_else(|| QueryError::InvalidSelector("top level must be an object".into()))?;

        let selector_obj = root
            .get("selector")
            .ok_or_else(|| QueryError::InvalidSelector("missing \"selector\" field".into()))?
            .as_object()
            .ok_or_else(|| QueryError::InvalidSelector("\"selector\" must be an object".into()))?;

        let mut parsed = Selector::default();
        for (field, spec) in selector_obj {
            for predicate in parse_field_spec(field, spec)? {
                parsed = parsed.field(field.clone(), predicate);
            }
        }

        if let Some(sort_value) = root.get("sort") {
            parsed.sort = Some(parse_sort(sort_value)?);
        }
        Ok(parsed)
    }
}

fn parse_field_spec(field: &str, spec: &Value) -> QueryResult<Vec<Predicate>> {
    let ops = match spec.as_object() {
        Some(ops) if ops.keys().any(|k| k.starts_with('$')) => ops,
        // Bare value (or an object with no $-operators): plain equality.
        _ => return Ok(vec![Predicate::Eq(spec.clone())]),
    };

    let mut predicates = Vec::with_capacity(ops.len());
    for (op, value) in ops {
        let predicate = match op.as_str() {
            "$eq" => Predicate::Eq(value.clone()),
            "$gt" => Predicate::Gt(value.clone()),
            "$gte" => Predicate::Gte(value.clone()),
            "$lt" => Predicate::Lt(value.clone()),
            "$lte" => Predicate::Lte(value.clone()),
            "$regex" => {
                let pattern = value.as_str().ok_or_else(|| {
                    QueryError::InvalidSelector(format!("$regex on {field:?} must be a string"))
                })?;
                Predicate::Regex(pattern.to_string())
            }
            "$in" => {
                let list = value.as_array().ok_or_else(|| {
                    QueryError::InvalidSelector(format!("$in on {field:?} must be an array"))
                })?;
                Predicate::In(list.clone())
            }
            other => {
                return Err(QueryError::InvalidSelector(format!(
                    "unsupported operator {other:?} on field {field:?}"
                )))
            }
        };
        predicates.push(predicate);
    }
    Ok(predicates)
}

fn parse_sort(value: &Value) -> QueryResult<Sort> {
    let entries = value
        .as_array()
        .ok_or_else(|| QueryError::InvalidSelector("\"sort\" must be an array".into()))?;
    if entries.len() != 1 {
        return Err(QueryError::InvalidSelector(
            "exactly one sort field is supported".into(),
        ));
    }
    let entry = entries[0]
        .as_object()
        .filter(|o| o.len() == 1)
        .ok_or_else(|| {
            QueryError::InvalidSelector("sort entry must be a single-field object".into())
        })?;
    let (field, dir) = entry.iter().next().expect("len checked above");
    let order = match dir.as_str() {
        Some("asc") => SortOrder::Asc,
        Some("desc") => SortOrder::Desc,
        _ => {
            return Err(QueryError::InvalidSelector(format!(
                "sort direction for {field:?} must be \"asc\" or \"desc\""
            )))
        }
    };
    Ok(Sort {
        field: field.clone(),
        order,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_selector_wire_shape() {
        assert_eq!(Selector::all().to_wire_json(), r#"{"selector":{}}"#);
    }

    #[test]
    fn equality_uses_bare_value_form() {
        let wire = Selector::all()
            .field("ownerUserId", Predicate::eq("user-42"))
            .to_wire_json();
        assert_eq!(wire, r#"{"selector":{"ownerUserId":"user-42"}}"#);
    }

    #[test]
    fn range_and_sort_wire_shape() {
        let wire = Selector::all()
            .field("insertTime", Predicate::gt("2024-01-01T00:00:00Z"))
            .sort_by("insertTime", SortOrder::Desc)
            .to_wire_json();
        assert_eq!(
            wire,
            r#"{"selector":{"insertTime":{"$gt":"2024-01-01T00:00:00Z"}},"sort":[{"insertTime":"desc"}]}"#
        );
    }

    #[test]
    fn bounded_range_merges_into_one_clause() {
        let selector = Selector::all()
            .field("insertTime", Predicate::gte("a"))
            .field("insertTime", Predicate::lte("b"));
        assert_eq!(selector.clauses().len(), 1);
        assert_eq!(selector.clauses()[0].predicates.len(), 2);
        let wire = selector.to_wire_json();
        assert_eq!(wire, r#"{"selector":{"insertTime":{"$gte":"a","$lte":"b"}}}"#);
    }

    #[test]
    fn starts_with_escapes_metacharacters() {
        let Predicate::Regex(pattern) = Predicate::starts_with("1HG.*(X)") else {
            panic!("expected regex predicate");
        };
        assert_eq!(pattern, r"^1HG\.\*\(X\)");
    }

    #[test]
    fn parse_roundtrip() {
        let selector = Selector::all()
            .field("carId", Predicate::eq("veh-001"))
            .field("insertTime", Predicate::gte("2024-01-01T00:00:00Z"))
            .field("insertTime", Predicate::lte("2024-02-01T00:00:00Z"))
            .sort_by("insertTime", SortOrder::Desc);
        let parsed = Selector::parse_wire(&selector.to_wire_json()).unwrap();
        assert_eq!(parsed, selector);
    }

    #[test]
    fn parse_accepts_legacy_handwritten_query() {
        // Shape produced by the previous string-formatted implementation.
        let raw = r#"{
            "selector": { "insertTime": { "$gt": "2024-01-01T00:00:00Z" } },
            "sort": [{ "insertTime": "desc" }]
        }"#;
        let parsed = Selector::parse_wire(raw).unwrap();
        assert_eq!(parsed.clauses().len(), 1);
        let sort = parsed.sort().unwrap();
        assert_eq!(sort.field, "insertTime");
        assert_eq!(sort.order, SortOrder::Desc);
    }

    #[test]
    fn parse_rejects_unknown_operator() {
        let raw = r#"{"selector":{"vin":{"$regexx":"^1HG"}}}"#;
        assert!(matches!(
            Selector::parse_wire(raw),
            Err(QueryError::InvalidSelector(_))
        ));
    }

    #[test]
    fn parse_rejects_multi_field_sort() {
        let raw = r#"{"selector":{},"sort":[{"a":"asc"},{"b":"desc"}]}"#;
        assert!(matches!(
            Selector::parse_wire(raw),
            Err(QueryError::InvalidSelector(_))
        ));
    }

    #[test]
    fn parse_rejects_non_json() {
        assert!(matches!(
            Selector::parse_wire("not json"),
            Err(QueryError::InvalidSelector(_))
        ));
    }

    #[test]
    fn in_list_wire_shape() {
        let wire = Selector::all()
            .field("ownerUserId", Predicate::in_list(["user-1", "user-2"]))
            .to_wire_json();
        assert_eq!(
            wire,
            r#"{"selector":{"ownerUserId":{"$in":["user-1","user-2"]}}}"#
        );
    }
}
