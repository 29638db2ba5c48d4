use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Follow edge - `user_id` receives posts of `author_id` in their following feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follow {
    pub id: i64,
    pub user_id: Uuid,
    pub author_id: Uuid,
}
