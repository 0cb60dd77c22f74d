use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

struct IssuedToken {
    booking_id: String,
    expires_at: DateTime<Utc>,
}

/// Single-use, short-lived tokens gating retrieval of a paid booking's issued
/// credential. Issue-and-redeem both run under one lock, so a token redeems
/// at most once no matter how many requests race on it. No await happens
/// while the lock is held.
pub struct AccessTokenStore {
    ttl: Duration,
    tokens: Mutex<HashMap<String, IssuedToken>>,
}

impl AccessTokenStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Mint a token for a booking. Expired leftovers are pruned here, so the
    /// map stays bounded by recent issuance volume.
    pub fn issue(&self, booking_id: &str, now: DateTime<Utc>) -> String {
        let token = Uuid::new_v4().to_string();
        let mut tokens = self.tokens.lock().expect("token store mutex poisoned");

        tokens.retain(|_, issued| issued.expires_at > now);
        tokens.insert(
            token.clone(),
            IssuedToken {
                booking_id: booking_id.to_string(),
                expires_at: now + self.ttl,
            },
        );

        token
    }

    /// Redeem a token, consuming it. Returns the booking it was issued for,
    /// or None when the token is unknown, already used, or expired.
    pub fn redeem(&self, token: &str, now: DateTime<Utc>) -> Option<String> {
        let mut tokens = self.tokens.lock().expect("token store mutex poisoned");

        let issued = tokens.remove(token)?;
        if issued.expires_at <= now {
            return None;
        }
        Some(issued.booking_id)
    }
}
