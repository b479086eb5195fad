/// Issued credential with its validity window `[iat, exp)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub iat_unix_ts: u64, // UNIX TIMESTAMP
    pub exp_unix_ts: u64, // UNIX TIMESTAMP
}

impl Token {
    pub fn new(value: String, iat_unix_ts: u64, exp_unix_ts: u64) -> Self {
        Self { value, iat_unix_ts, exp_unix_ts }
    }

    /// `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.value)
    }

    pub fn is_valid_at(&self, now: u64) -> bool {
        self.iat_unix_ts <= now && now < self.exp_unix_ts
    }

    pub fn remaining_seconds(&self, now: u64) -> u64 {
        self.exp_unix_ts.saturating_sub(now)
    }
}
