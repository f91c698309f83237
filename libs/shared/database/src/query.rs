use std::fmt::Display;

/// Builds PostgREST query strings. Values are percent-encoded; column names
/// are trusted and passed through.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    parts: Vec<String>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.parts.push(format!("select={}", columns));
        self
    }

    pub fn eq(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "eq", value)
    }

    pub fn neq(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "neq", value)
    }

    pub fn gte(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "gte", value)
    }

    pub fn lte(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "lte", value)
    }

    pub fn lt(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "lt", value)
    }

    /// Case-insensitive substring match.
    pub fn ilike(mut self, column: &str, term: &str) -> Self {
        self.parts.push(format!(
            "{}=ilike.*{}*",
            column,
            urlencoding::encode(&sanitize_term(term))
        ));
        self
    }

    /// Case-insensitive substring match on any of `columns`.
    pub fn ilike_any(mut self, columns: &[&str], term: &str) -> Self {
        let term = urlencoding::encode(&sanitize_term(term)).into_owned();
        let clauses: Vec<String> = columns
            .iter()
            .map(|c| format!("{}.ilike.*{}*", c, term))
            .collect();
        self.parts.push(format!("or=({})", clauses.join(",")));
        self
    }

    pub fn in_list<S: AsRef<str>>(mut self, column: &str, values: &[S]) -> Self {
        let encoded: Vec<String> = values
            .iter()
            .map(|v| urlencoding::encode(&sanitize_term(v.as_ref())).into_owned())
            .collect();
        self.parts.push(format!("{}=in.({})", column, encoded.join(",")));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.parts.push(format!("order={}.{}", column, direction));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.parts.push(format!("limit={}", limit));
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.parts.push(format!("offset={}", offset));
        self
    }

    pub fn build(&self) -> String {
        self.parts.join("&")
    }

    fn filter(mut self, column: &str, op: &str, value: impl Display) -> Self {
        self.parts.push(format!(
            "{}={}.{}",
            column,
            op,
            urlencoding::encode(&value.to_string())
        ));
        self
    }
}

// PostgREST reserves these inside `or=(...)` and `in.(...)` lists.
fn sanitize_term(term: &str) -> String {
    term.chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '*'))
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_filters_in_order() {
        let query = QueryBuilder::new()
            .select("*")
            .eq("category", "shoes")
            .gte("price", 10)
            .lte("price", 99.5)
            .order("createdAt", false)
            .offset(20)
            .limit(10)
            .build();

        assert_eq!(
            query,
            "select=*&category=eq.shoes&price=gte.10&price=lte.99.5&order=createdAt.desc&offset=20&limit=10"
        );
    }

    #[test]
    fn encodes_values() {
        let query = QueryBuilder::new()
            .gte("createdAt", "2024-01-01T00:00:00+00:00")
            .build();
        assert_eq!(query, "createdAt=gte.2024-01-01T00%3A00%3A00%2B00%3A00");
    }

    #[test]
    fn search_terms_drop_reserved_characters() {
        let query = QueryBuilder::new()
            .ilike_any(&["name", "description"], "red (large), shoe")
            .build();
        assert_eq!(
            query,
            "or=(name.ilike.*red%20large%20shoe*,description.ilike.*red%20large%20shoe*)"
        );
    }

    #[test]
    fn in_list_joins_values() {
        let query = QueryBuilder::new().in_list("id", &["a", "b"]).build();
        assert_eq!(query, "id=in.(a,b)");
    }
}
