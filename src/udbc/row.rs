use crate::udbc::value::Value;
use std::sync::Arc;

/// One result row. Columns keep the order the backend returned them in.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Value of the named column. With duplicate names the first one wins.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }
}

/// Rows produced by one execution.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Rows changed by a DML statement, or rows returned by a query.
    pub row_count: u64,
}

impl ResultSet {
    /// Result of a statement that produced no result columns.
    pub fn affected(row_count: u64) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            row_count,
        }
    }

    pub fn with_rows(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let row_count = rows.len() as u64;
        Self {
            columns,
            rows,
            row_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_lookup() {
        let cols: Arc<[String]> = vec!["id".to_string(), "name".to_string()].into();
        let row = Row::new(cols, vec![Value::Int(1), Value::from("Alice")]);
        assert_eq!(row.get("name"), Some(&Value::Str("Alice".into())));
        assert_eq!(row.get_index(0), Some(&Value::Int(1)));
        assert!(row.get("missing").is_none());
        let names: Vec<&str> = row.iter().map(|(c, _)| c).collect();
        assert_eq!(names, ["id", "name"]);
    }
}
