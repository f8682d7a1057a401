use serde::Deserialize;

pub mod auth;
pub mod health;
pub mod project;
pub mod task;
pub mod user;

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    10
}

/// Common `?page=&page_size=` query; out-of-range values are clamped by the
/// repository layer.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_apply_to_missing_fields() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.page, 1);
        assert_eq!(p.page_size, 10);

        let p: Pagination = serde_json::from_str(r#"{"page": 3}"#).unwrap();
        assert_eq!(p.page, 3);
        assert_eq!(p.page_size, 10);
    }
}
