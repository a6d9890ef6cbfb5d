use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub rating: Option<String>,
    pub duration_minutes: Option<i32>,
}

/// Данные для создания фильма (используется только при сидировании).
#[derive(Debug, Clone)]
pub struct NewMovie {
    pub title: String,
    pub description: String,
    pub rating: String,
    pub duration_minutes: i32,
}
