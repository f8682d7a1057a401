use uuid::Uuid;

/// Entity snapshots live for an hour; cached list pages only five minutes
/// since any mutation of the type invalidates them wholesale anyway.
pub const ENTITY_TTL_SECS: u64 = 3600;
pub const LIST_TTL_SECS: u64 = 300;

/// Per-id snapshot key, e.g. `project:5b2c...`.
pub fn entity_key(entity_type: &str, id: Uuid) -> String {
    format!("{}:{}", entity_type, id)
}

/// Paginated query key, parameterized by the exact serialized query.
pub fn list_key(entity_type: &str, params: &str) -> String {
    format!("{}:list:{}", entity_type, params)
}

/// Pattern matching every cached list page of a type.
pub fn list_pattern(entity_type: &str) -> String {
    format!("{}:list:*", entity_type)
}

/// Single-slot refresh-token key for a user.
pub fn refresh_token_key(user_id: Uuid) -> String {
    format!("refresh_token:{}", user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_formats() {
        let id = Uuid::nil();
        assert_eq!(
            entity_key("project", id),
            "project:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(
            list_key("task", r#"{"skip":0,"take":10}"#),
            r#"task:list:{"skip":0,"take":10}"#
        );
        assert_eq!(list_pattern("user"), "user:list:*");
        assert_eq!(
            refresh_token_key(id),
            "refresh_token:00000000-0000-0000-0000-000000000000"
        );
    }
}
