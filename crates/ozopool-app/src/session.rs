// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::{Duration, OffsetDateTime};

use crate::UserId;

/// Sessions older than this are treated as expired locally, matching the
/// timestamp bookkeeping the backend expects from clients.
pub const SESSION_TTL: Duration = Duration::hours(24);

/// Authenticated caller context. Created by login, handed explicitly to
/// whatever needs it, dropped on logout. Nothing global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub user_role: String,
    pub customer_type: String,
    pub user_id: UserId,
    pub email: String,
    pub issued_at: OffsetDateTime,
}

impl Session {
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now - self.issued_at >= SESSION_TTL
    }
}

#[cfg(test)]
mod tests {
    use super::{SESSION_TTL, Session};
    use crate::UserId;
    use time::{Duration, OffsetDateTime};

    fn session(issued_at: OffsetDateTime) -> Session {
        Session {
            access_token: "tok-123".to_owned(),
            user_role: "Admin".to_owned(),
            customer_type: "Partner".to_owned(),
            user_id: UserId::from("u1"),
            email: "ana@ozopool.in".to_owned(),
            issued_at,
        }
    }

    #[test]
    fn bearer_header_carries_token() {
        let now = OffsetDateTime::UNIX_EPOCH;
        assert_eq!(session(now).bearer_header(), "Bearer tok-123");
    }

    #[test]
    fn expiry_window() {
        let issued = OffsetDateTime::UNIX_EPOCH;
        let session = session(issued);
        assert!(!session.is_expired(issued + Duration::hours(23)));
        assert!(session.is_expired(issued + SESSION_TTL));
        assert!(session.is_expired(issued + Duration::hours(25)));
    }
}
