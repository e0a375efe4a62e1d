/// Parameterized SQL queries
///
/// [`Query`] mirrors the Cosmos DB query body:
///
/// ```json
/// { "query": "SELECT * FROM c WHERE c.orgId = @orgId", "parameters": [{ "name": "@orgId", "value": "org-acme" }] }
/// ```
///
/// [`ParsedQuery`] understands the subset of that SQL dialect the portal
/// emits, so the in-memory store can evaluate the same queries:
///
/// ```text
/// SELECT [TOP n] * FROM c [WHERE c.a = @p [AND c.b = @q ...]] [ORDER BY c.f [ASC|DESC]]
/// ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

use super::store::{StoreError, StoreResult};

/// A named query parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParameter {
    pub name: String,
    pub value: Value,
}

/// SQL text plus parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(rename = "query")]
    pub text: String,

    #[serde(default)]
    pub parameters: Vec<QueryParameter>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parameters: Vec::new(),
        }
    }

    /// Adds a parameter (builder style)
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.push(QueryParameter {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.iter().find(|p| p.name == name).map(|p| &p.value)
    }
}

/// Sort direction for `ORDER BY`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// One `c.field = value` condition
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub path: Vec<String>,
    pub value: Value,
}

/// A query reduced to its filter, ordering and limit
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    pub top: Option<usize>,
    pub conditions: Vec<Condition>,
    pub order_by: Option<(Vec<String>, Direction)>,
}

impl ParsedQuery {
    /// Parses the supported subset, resolving `@name` parameters
    pub fn parse(query: &Query) -> StoreResult<Self> {
        let tokens: Vec<&str> = query.text.split_whitespace().collect();
        let mut pos = 0;

        expect_keyword(&tokens, &mut pos, "SELECT")?;

        let mut top = None;
        if peek_keyword(&tokens, pos, "TOP") {
            pos += 1;
            let count = tokens
                .get(pos)
                .ok_or_else(|| invalid("TOP requires a count"))?;
            top = Some(
                count
                    .parse::<usize>()
                    .map_err(|_| invalid(format!("Invalid TOP count '{}'", count)))?,
            );
            pos += 1;
        }

        if tokens.get(pos) != Some(&"*") {
            return Err(invalid("Only SELECT * projections are supported"));
        }
        pos += 1;

        expect_keyword(&tokens, &mut pos, "FROM")?;
        let alias = *tokens.get(pos).ok_or_else(|| invalid("Missing FROM alias"))?;
        pos += 1;

        let mut conditions = Vec::new();
        if peek_keyword(&tokens, pos, "WHERE") {
            pos += 1;
            loop {
                let lhs = tokens.get(pos).ok_or_else(|| invalid("Missing condition"))?;
                let op = tokens.get(pos + 1).ok_or_else(|| invalid("Missing operator"))?;
                let rhs = tokens.get(pos + 2).ok_or_else(|| invalid("Missing operand"))?;
                if *op != "=" {
                    return Err(invalid(format!("Unsupported operator '{}'", op)));
                }
                conditions.push(Condition {
                    path: field_path(alias, lhs)?,
                    value: resolve_operand(query, rhs)?,
                });
                pos += 3;

                if peek_keyword(&tokens, pos, "AND") {
                    pos += 1;
                } else {
                    break;
                }
            }
        }

        let mut order_by = None;
        if peek_keyword(&tokens, pos, "ORDER") {
            pos += 1;
            expect_keyword(&tokens, &mut pos, "BY")?;
            let field = tokens.get(pos).ok_or_else(|| invalid("Missing ORDER BY field"))?;
            pos += 1;
            let direction = if peek_keyword(&tokens, pos, "DESC") {
                pos += 1;
                Direction::Desc
            } else {
                if peek_keyword(&tokens, pos, "ASC") {
                    pos += 1;
                }
                Direction::Asc
            };
            order_by = Some((field_path(alias, field)?, direction));
        }

        if pos != tokens.len() {
            return Err(invalid(format!("Unexpected token '{}'", tokens[pos])));
        }

        Ok(Self {
            top,
            conditions,
            order_by,
        })
    }

    /// Whether a document satisfies every condition
    pub fn matches(&self, document: &Value) -> bool {
        self.conditions
            .iter()
            .all(|c| lookup(document, &c.path) == Some(&c.value))
    }

    /// Filters, sorts and truncates a set of documents
    pub fn apply<'a>(&self, documents: impl Iterator<Item = &'a Value>) -> Vec<Value> {
        let mut rows: Vec<Value> = documents.filter(|d| self.matches(d)).cloned().collect();

        if let Some((path, direction)) = &self.order_by {
            rows.sort_by(|a, b| {
                let ordering = compare_values(lookup(a, path), lookup(b, path));
                match direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        if let Some(top) = self.top {
            rows.truncate(top);
        }

        rows
    }
}

fn invalid(message: impl Into<String>) -> StoreError {
    StoreError::InvalidQuery(message.into())
}

fn peek_keyword(tokens: &[&str], pos: usize, keyword: &str) -> bool {
    tokens
        .get(pos)
        .map(|t| t.eq_ignore_ascii_case(keyword))
        .unwrap_or(false)
}

fn expect_keyword(tokens: &[&str], pos: &mut usize, keyword: &str) -> StoreResult<()> {
    if !peek_keyword(tokens, *pos, keyword) {
        return Err(invalid(format!("Expected {}", keyword)));
    }
    *pos += 1;
    Ok(())
}

fn field_path(alias: &str, token: &str) -> StoreResult<Vec<String>> {
    let rest = token
        .strip_prefix(alias)
        .and_then(|r| r.strip_prefix('.'))
        .ok_or_else(|| invalid(format!("Field '{}' must be qualified with '{}.'", token, alias)))?;

    Ok(rest.split('.').map(str::to_string).collect())
}

fn resolve_operand(query: &Query, token: &str) -> StoreResult<Value> {
    if token.starts_with('@') {
        return query
            .parameter(token)
            .cloned()
            .ok_or_else(|| invalid(format!("Missing parameter {}", token)));
    }

    if let Some(inner) = token
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
    {
        return Ok(Value::String(inner.to_string()));
    }

    match token {
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        "null" => Ok(Value::Null),
        _ => serde_json::from_str::<serde_json::Number>(token)
            .map(Value::Number)
            .map_err(|_| invalid(format!("Unsupported operand '{}'", token))),
    }
}

fn lookup<'a>(document: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(document, |current, key| current.get(key))
}

/// Orders undefined < null < bool < number < string, the way Cosmos DB does
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Bool(_)) => 2,
            Some(Value::Number(_)) => 3,
            Some(Value::String(_)) => 4,
            Some(_) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_serializes_like_cosmos() {
        let query = Query::new("SELECT * FROM c WHERE c.orgId = @orgId").param("@orgId", "org-1");
        let body = serde_json::to_value(&query).unwrap();

        assert_eq!(body["query"], "SELECT * FROM c WHERE c.orgId = @orgId");
        assert_eq!(body["parameters"][0]["name"], "@orgId");
        assert_eq!(body["parameters"][0]["value"], "org-1");
    }

    #[test]
    fn test_parse_full_query() {
        let query = Query::new(
            "SELECT TOP 5 * FROM c WHERE c.projectId = @projectId AND c.status = 'todo' ORDER BY c.dueDate DESC",
        )
        .param("@projectId", "p1");

        let parsed = ParsedQuery::parse(&query).unwrap();
        assert_eq!(parsed.top, Some(5));
        assert_eq!(parsed.conditions.len(), 2);
        assert_eq!(parsed.conditions[0].path, vec!["projectId".to_string()]);
        assert_eq!(parsed.conditions[0].value, json!("p1"));
        assert_eq!(parsed.conditions[1].value, json!("todo"));
        assert_eq!(
            parsed.order_by,
            Some((vec!["dueDate".to_string()], Direction::Desc))
        );
    }

    #[test]
    fn test_parse_rejects_unsupported_syntax() {
        assert!(ParsedQuery::parse(&Query::new("SELECT c.id FROM c")).is_err());
        assert!(ParsedQuery::parse(&Query::new("SELECT * FROM c WHERE c.a > 1")).is_err());
        assert!(ParsedQuery::parse(&Query::new("SELECT * FROM c WHERE c.a = @missing")).is_err());
        assert!(ParsedQuery::parse(&Query::new("DELETE FROM c")).is_err());
    }

    #[test]
    fn test_apply_filters_sorts_and_limits() {
        let docs = vec![
            json!({"id": "a", "orgId": "o1", "priority": 2}),
            json!({"id": "b", "orgId": "o2", "priority": 5}),
            json!({"id": "c", "orgId": "o1", "priority": 4}),
            json!({"id": "d", "orgId": "o1"}),
        ];

        let query = Query::new("SELECT TOP 2 * FROM c WHERE c.orgId = @org ORDER BY c.priority DESC")
            .param("@org", "o1");
        let rows = ParsedQuery::parse(&query).unwrap().apply(docs.iter());

        let ids: Vec<&str> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[test]
    fn test_nested_field_lookup() {
        let docs = vec![json!({"id": "x", "owner": {"email": "a@b.co"}})];
        let query = Query::new("SELECT * FROM c WHERE c.owner.email = @email").param("@email", "a@b.co");

        let rows = ParsedQuery::parse(&query).unwrap().apply(docs.iter());
        assert_eq!(rows.len(), 1);
    }
}
