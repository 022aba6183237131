//! Query filters, ordering and limit
//!
//! 托管文档库支持的子集：等值 / 范围过滤、单字段排序、limit。
//! 本地后端在内存里对 JSON 文档求值。

use serde_json::Value;
use std::cmp::Ordering;

use super::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Collection query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    /// Match every document
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Eq, value)
    }

    pub fn where_gte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Gte, value)
    }

    pub fn where_lt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Lt, value)
    }

    pub fn where_lte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Lte, value)
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Whether a document payload satisfies every filter
    ///
    /// 缺失字段不满足任何过滤条件
    pub fn matches(&self, data: &Value) -> bool {
        self.filters.iter().all(|f| {
            let Some(actual) = data.get(&f.field) else {
                return false;
            };
            match (f.op, compare_values(actual, &f.value)) {
                (FilterOp::Eq, Some(o)) => o == Ordering::Equal,
                (FilterOp::Gt, Some(o)) => o == Ordering::Greater,
                (FilterOp::Gte, Some(o)) => o != Ordering::Less,
                (FilterOp::Lt, Some(o)) => o == Ordering::Less,
                (FilterOp::Lte, Some(o)) => o != Ordering::Greater,
                (_, None) => false,
            }
        })
    }

    /// Filter, sort and truncate a document set
    pub fn apply(&self, docs: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut out: Vec<Document> = docs.into_iter().filter(|d| self.matches(&d.data)).collect();

        if let Some((field, direction)) = &self.order_by {
            out.sort_by(|a, b| {
                let ord = match (a.data.get(field), b.data.get(field)) {
                    (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                    (Some(_), None) => Ordering::Greater,
                    (None, Some(_)) => Ordering::Less,
                    (None, None) => Ordering::Equal,
                };
                match direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            });
        }

        if let Some(n) = self.limit {
            out.truncate(n);
        }
        out
    }
}

/// Compare two JSON scalars of the same kind
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, data: Value) -> Document {
        Document {
            id: id.into(),
            data,
        }
    }

    #[test]
    fn test_eq_and_range() {
        let q = Query::all()
            .where_eq("payment", "Cash")
            .where_gte("timestamp", 100)
            .where_lt("timestamp", 200);

        assert!(q.matches(&json!({"payment": "Cash", "timestamp": 150})));
        assert!(!q.matches(&json!({"payment": "Online", "timestamp": 150})));
        assert!(!q.matches(&json!({"payment": "Cash", "timestamp": 200})));
        assert!(!q.matches(&json!({"payment": "Cash"})));
    }

    #[test]
    fn test_type_mismatch_never_matches() {
        let q = Query::all().where_eq("table", "5");
        assert!(!q.matches(&json!({"table": 5})));
    }

    #[test]
    fn test_order_and_limit() {
        let docs = vec![
            doc("a", json!({"timestamp": 3})),
            doc("b", json!({"timestamp": 1})),
            doc("c", json!({"timestamp": 2})),
        ];
        let out = Query::all()
            .order_by("timestamp", Direction::Desc)
            .limit(2)
            .apply(docs);
        let ids: Vec<_> = out.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }
}
