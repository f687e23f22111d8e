//! Reusable SQL query builder for dynamic WHERE clauses.
//!
//! This module provides a builder pattern for constructing SQL queries with
//! dynamic conditions while tracking parameter indices for safe binding.

/// Builder for constructing SQL WHERE clauses with parameter tracking.
///
/// # Example
/// ```ignore
/// let mut qb = QueryBuilder::new();
/// qb.add_optional(&filter.tour_type, |idx| format!("tour_type = ${idx}"));
/// let where_clause = qb.build_where_clause();
/// ```
#[derive(Debug)]
pub struct QueryBuilder {
    conditions: Vec<String>,
    param_idx: usize,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryBuilder {
    /// Creates a new empty query builder.
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
            param_idx: 1,
        }
    }

    /// Adds an optional value as a condition if it's Some.
    /// The condition_fn receives the current param index and should return the condition string.
    pub fn add_optional<T, F>(&mut self, value: &Option<T>, condition_fn: F) -> &mut Self
    where
        F: FnOnce(usize) -> String,
    {
        if value.is_some() {
            let condition = condition_fn(self.param_idx);
            self.conditions.push(condition);
            self.param_idx += 1;
        }
        self
    }

    /// Increments and returns the next parameter index.
    pub fn next_param_idx(&mut self) -> usize {
        let idx = self.param_idx;
        self.param_idx += 1;
        idx
    }

    /// Builds the full WHERE clause including the "WHERE" keyword.
    /// Returns "WHERE 1=1" if no conditions (always true).
    pub fn build_where_clause(&self) -> String {
        if self.conditions.is_empty() {
            "WHERE 1=1".to_string()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_builder() {
        let mut qb = QueryBuilder::default();
        assert_eq!(qb.build_where_clause(), "WHERE 1=1");
        assert_eq!(qb.next_param_idx(), 1);
        assert_eq!(qb.next_param_idx(), 2);
    }

    #[test]
    fn test_optional_some_and_none() {
        let mut qb = QueryBuilder::new();
        let min: Option<f64> = Some(10.0);
        let max: Option<f64> = None;
        let elevation: Option<f64> = Some(100.0);
        qb.add_optional(&min, |idx| format!("distance_km >= ${idx}"))
            .add_optional(&max, |idx| format!("distance_km <= ${idx}"))
            .add_optional(&elevation, |idx| format!("elevation_up >= ${idx}"));

        assert_eq!(
            qb.build_where_clause(),
            "WHERE distance_km >= $1 AND elevation_up >= $2"
        );
        assert_eq!(qb.next_param_idx(), 3);
    }
}
