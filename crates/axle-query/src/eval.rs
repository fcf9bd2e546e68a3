//! In-memory evaluation of selectors against JSON records.
//!
//! The engine assumes no secondary index: callers hand it the scanned
//! `(key, record)` population and it filters and sorts in memory. Restricting
//! the population first (composite-key prefix scans) is the caller's
//! responsibility.

use std::cmp::Ordering;

use chrono::DateTime;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::selector::{Predicate, Selector, Sort, SortOrder};

/// A selector with its `$regex` patterns compiled, ready for repeated
/// evaluation over a scan.
pub struct CompiledSelector {
    clauses: Vec<(String, Vec<CompiledPredicate>)>,
    sort: Option<Sort>,
}

enum CompiledPredicate {
    Eq(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    Regex(Regex),
    In(Vec<Value>),
}

impl CompiledSelector {
    pub fn compile(selector: &Selector) -> QueryResult<Self> {
        let mut clauses = Vec::with_capacity(selector.clauses().len());
        for clause in selector.clauses() {
            let mut compiled = Vec::with_capacity(clause.predicates.len());
            for predicate in &clause.predicates {
                compiled.push(match predicate {
                    Predicate::Eq(v) => CompiledPredicate::Eq(v.clone()),
                    Predicate::Gt(v) => CompiledPredicate::Gt(v.clone()),
                    Predicate::Gte(v) => CompiledPredicate::Gte(v.clone()),
                    Predicate::Lt(v) => CompiledPredicate::Lt(v.clone()),
                    Predicate::Lte(v) => CompiledPredicate::Lte(v.clone()),
                    Predicate::Regex(pattern) => CompiledPredicate::Regex(
                        Regex::new(pattern)
                            .map_err(|e| QueryError::InvalidRegex(e.to_string()))?,
                    ),
                    Predicate::In(vs) => CompiledPredicate::In(vs.clone()),
                });
            }
            clauses.push((clause.field.clone(), compiled));
        }
        Ok(Self {
            clauses,
            sort: selector.sort().cloned(),
        })
    }

    /// Returns `true` if every clause matches the record.
    ///
    /// A predicate on a field the record does not carry never matches.
    pub fn matches(&self, record: &Value) -> bool {
        self.clauses.iter().all(|(field, predicates)| {
            match record.get(field) {
                Some(value) => predicates.iter().all(|p| p.matches(value)),
                None => false,
            }
        })
    }

    pub fn sort(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }
}

impl CompiledPredicate {
    fn matches(&self, value: &Value) -> bool {
        match self {
            CompiledPredicate::Eq(expected) => value_cmp(value, expected) == Ordering::Equal,
            CompiledPredicate::Gt(bound) => value_cmp(value, bound) == Ordering::Greater,
            CompiledPredicate::Gte(bound) => value_cmp(value, bound) != Ordering::Less,
            CompiledPredicate::Lt(bound) => value_cmp(value, bound) == Ordering::Less,
            CompiledPredicate::Lte(bound) => value_cmp(value, bound) != Ordering::Greater,
            CompiledPredicate::Regex(re) => value.as_str().is_some_and(|s| re.is_match(s)),
            CompiledPredicate::In(candidates) => candidates
                .iter()
                .any(|c| value_cmp(value, c) == Ordering::Equal),
        }
    }
}

/// Filter and sort a scanned population against a selector.
///
/// Returns matches in the selector's sort order (or key order when no sort
/// is given), with ties on the sort field broken by key ascending so the
/// result is a total order regardless of direction.
pub fn run_query(
    entries: Vec<(String, Value)>,
    selector: &Selector,
) -> QueryResult<Vec<(String, Value)>> {
    let compiled = CompiledSelector::compile(selector)?;
    let scanned = entries.len();

    let mut matched: Vec<(String, Value)> = entries
        .into_iter()
        .filter(|(_, record)| compiled.matches(record))
        .collect();

    if let Some(sort) = compiled.sort() {
        let field = sort.field.clone();
        let order = sort.order;
        matched.sort_by(|a, b| {
            let left = a.1.get(&field).unwrap_or(&Value::Null);
            let right = b.1.get(&field).unwrap_or(&Value::Null);
            let primary = match order {
                SortOrder::Asc => value_cmp(left, right),
                SortOrder::Desc => value_cmp(right, left),
            };
            primary.then_with(|| a.0.cmp(&b.0))
        });
    } else {
        matched.sort_by(|a, b| a.0.cmp(&b.0));
    }

    debug!(scanned, matched = matched.len(), "selector query evaluated");
    Ok(matched)
}

/// Total order over JSON values, following the backend's collation:
/// null < bool < number < string < array < object.
///
/// Strings that both parse as RFC 3339 timestamps compare chronologically,
/// so `$gt` on a timestamp field is strict at nanosecond resolution even
/// when the serialized precision differs.
pub fn value_cmp(a: &Value, b: &Value) -> Ordering {
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
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => {
            match (
                DateTime::parse_from_rfc3339(x),
                DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(tx), Ok(ty)) => tx.cmp(&ty),
                _ => x.cmp(y),
            }
        }
        (Value::Array(xs), Value::Array(ys)) => {
            for (x, y) in xs.iter().zip(ys.iter()) {
                let ord = value_cmp(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            xs.len().cmp(&ys.len())
        }
        (Value::Object(x), Value::Object(y)) => x
            .len()
            .cmp(&y.len())
            .then_with(|| Value::Object(x.clone()).to_string().cmp(&Value::Object(y.clone()).to_string())),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::Predicate;
    use serde_json::json;

    fn entries(records: &[(&str, Value)]) -> Vec<(String, Value)> {
        records
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Predicate semantics
    // -----------------------------------------------------------------------

    #[test]
    fn equality_matches() {
        let selector = Selector::all().field("ownerUserId", Predicate::eq("user-1"));
        let population = entries(&[
            ("a", json!({"ownerUserId": "user-1"})),
            ("b", json!({"ownerUserId": "user-2"})),
            ("c", json!({"carId": "veh-1"})),
        ]);
        let result = run_query(population, &selector).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].0, "a");
    }

    #[test]
    fn missing_field_never_matches() {
        let selector = Selector::all().field("vin", Predicate::gt(""));
        let population = entries(&[("a", json!({"carId": "veh-1"}))]);
        assert!(run_query(population, &selector).unwrap().is_empty());
    }

    #[test]
    fn strict_gt_on_timestamps_at_nanosecond_resolution() {
        let boundary = "2024-01-01T00:00:00Z";
        let selector = Selector::all().field("registeredAt", Predicate::gt(boundary));
        let population = entries(&[
            ("at", json!({"registeredAt": "2024-01-01T00:00:00Z"})),
            ("plus1ns", json!({"registeredAt": "2024-01-01T00:00:00.000000001Z"})),
            ("before", json!({"registeredAt": "2023-12-31T23:59:59.999999999Z"})),
        ]);
        let result = run_query(population, &selector).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].0, "plus1ns");
    }

    #[test]
    fn timestamp_compare_ignores_serialized_precision() {
        // Same instant, different textual precision.
        let a = json!("2024-01-01T00:00:00Z");
        let b = json!("2024-01-01T00:00:00.000000000Z");
        assert_eq!(value_cmp(&a, &b), Ordering::Equal);
    }

    #[test]
    fn bounded_range_is_inclusive() {
        let selector = Selector::all()
            .field("insertTime", Predicate::gte("2024-01-01T00:00:00Z"))
            .field("insertTime", Predicate::lte("2024-01-31T00:00:00Z"));
        let population = entries(&[
            ("lo", json!({"insertTime": "2024-01-01T00:00:00Z"})),
            ("mid", json!({"insertTime": "2024-01-15T00:00:00Z"})),
            ("hi", json!({"insertTime": "2024-01-31T00:00:00Z"})),
            ("out", json!({"insertTime": "2024-02-01T00:00:00Z"})),
        ]);
        let result = run_query(population, &selector).unwrap();
        let keys: Vec<_> = result.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["lo", "mid", "hi"]);
    }

    #[test]
    fn regex_prefix_match() {
        let selector = Selector::all().field("vin", Predicate::starts_with("1HG"));
        let population = entries(&[
            ("a", json!({"vin": "1HGBH41JXMN109186"})),
            ("b", json!({"vin": "WVWZZZ1JZXW000001"})),
            ("c", json!({"vin": 42})),
        ]);
        let result = run_query(population, &selector).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].0, "a");
    }

    #[test]
    fn regex_on_non_string_is_no_match() {
        let selector = Selector::all().field("vin", Predicate::regex("^4"));
        let population = entries(&[("a", json!({"vin": 42}))]);
        assert!(run_query(population, &selector).unwrap().is_empty());
    }

    #[test]
    fn invalid_regex_is_an_error() {
        let selector = Selector::all().field("vin", Predicate::regex("("));
        let err = run_query(Vec::new(), &selector).unwrap_err();
        assert!(matches!(err, QueryError::InvalidRegex(_)));
    }

    #[test]
    fn in_list_membership() {
        let selector =
            Selector::all().field("ownerUserId", Predicate::in_list(["user-1", "user-3"]));
        let population = entries(&[
            ("a", json!({"ownerUserId": "user-1"})),
            ("b", json!({"ownerUserId": "user-2"})),
            ("c", json!({"ownerUserId": "user-3"})),
        ]);
        let result = run_query(population, &selector).unwrap();
        let keys: Vec<_> = result.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn conjunction_requires_all_clauses() {
        let selector = Selector::all()
            .field("carId", Predicate::eq("veh-1"))
            .field("insertTime", Predicate::gt("2024-01-01T00:00:00Z"));
        let population = entries(&[
            ("match", json!({"carId": "veh-1", "insertTime": "2024-02-01T00:00:00Z"})),
            ("wrong_car", json!({"carId": "veh-2", "insertTime": "2024-02-01T00:00:00Z"})),
            ("too_early", json!({"carId": "veh-1", "insertTime": "2023-02-01T00:00:00Z"})),
        ]);
        let result = run_query(population, &selector).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].0, "match");
    }

    #[test]
    fn empty_selector_matches_everything() {
        let population = entries(&[("b", json!({"x": 1})), ("a", json!({"y": 2}))]);
        let result = run_query(population, &Selector::all()).unwrap();
        // No sort: key order.
        let keys: Vec<_> = result.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn no_match_is_empty_not_error() {
        let selector = Selector::all().field("ownerUserId", Predicate::eq("nobody"));
        assert!(run_query(Vec::new(), &selector).unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Sorting
    // -----------------------------------------------------------------------

    #[test]
    fn sort_descending_with_key_tie_break() {
        let selector = Selector::all().sort_by("insertTime", SortOrder::Desc);
        let population = entries(&[
            ("k2", json!({"insertTime": "2024-01-02T00:00:00Z"})),
            ("k3", json!({"insertTime": "2024-01-01T00:00:00Z"})),
            ("k1", json!({"insertTime": "2024-01-02T00:00:00Z"})),
        ]);
        let result = run_query(population, &selector).unwrap();
        let keys: Vec<_> = result.iter().map(|(k, _)| k.as_str()).collect();
        // Ties on insertTime resolve by key ascending in either direction.
        assert_eq!(keys, vec!["k1", "k2", "k3"]);
    }

    #[test]
    fn sort_ascending() {
        let selector = Selector::all().sort_by("n", SortOrder::Asc);
        let population = entries(&[
            ("a", json!({"n": 3})),
            ("b", json!({"n": 1})),
            ("c", json!({"n": 2})),
        ]);
        let result = run_query(population, &selector).unwrap();
        let keys: Vec<_> = result.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "c", "a"]);
    }

    #[test]
    fn records_missing_sort_field_sort_first() {
        let selector = Selector::all().sort_by("n", SortOrder::Asc);
        let population = entries(&[("a", json!({"n": 1})), ("b", json!({"m": 9}))]);
        let result = run_query(population, &selector).unwrap();
        assert_eq!(result[0].0, "b");
    }

    // -----------------------------------------------------------------------
    // Collation
    // -----------------------------------------------------------------------

    #[test]
    fn type_rank_order() {
        let null = json!(null);
        let boolean = json!(true);
        let number = json!(5);
        let string = json!("x");
        let array = json!([1]);
        let object = json!({"a": 1});
        assert_eq!(value_cmp(&null, &boolean), Ordering::Less);
        assert_eq!(value_cmp(&boolean, &number), Ordering::Less);
        assert_eq!(value_cmp(&number, &string), Ordering::Less);
        assert_eq!(value_cmp(&string, &array), Ordering::Less);
        assert_eq!(value_cmp(&array, &object), Ordering::Less);
    }

    #[test]
    fn integer_and_float_compare_numerically() {
        assert_eq!(value_cmp(&json!(1), &json!(1.0)), Ordering::Equal);
        assert_eq!(value_cmp(&json!(2), &json!(1.5)), Ordering::Greater);
    }

    #[test]
    fn plain_strings_compare_lexicographically() {
        assert_eq!(value_cmp(&json!("abc"), &json!("abd")), Ordering::Less);
    }
}
