use serde::Serialize;

/// A topic posts can be tagged with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}
