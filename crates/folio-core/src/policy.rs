//! Authorization rules. Pure functions, no I/O.

use uuid::Uuid;

use crate::domain::Post;

/// Only the author may edit a post.
pub fn can_edit(actor: Uuid, post: &Post) -> bool {
    actor == post.author_id
}

/// Anyone may follow anyone except themselves.
pub fn can_follow(actor: Uuid, target: Uuid) -> bool {
    actor != target
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post_by(author_id: Uuid) -> Post {
        Post {
            id: 1,
            text: "Тестовый текст".to_string(),
            pub_date: Utc::now(),
            author_id,
            group_id: None,
            image: None,
        }
    }

    #[test]
    fn test_author_can_edit() {
        let author = Uuid::new_v4();
        assert!(can_edit(author, &post_by(author)));
    }

    #[test]
    fn test_other_user_cannot_edit() {
        let author = Uuid::new_v4();
        for _ in 0..5 {
            assert!(!can_edit(Uuid::new_v4(), &post_by(author)));
        }
    }

    #[test]
    fn test_self_follow_forbidden() {
        let user = Uuid::new_v4();
        assert!(!can_follow(user, user));
        assert!(can_follow(user, Uuid::new_v4()));
    }
}
