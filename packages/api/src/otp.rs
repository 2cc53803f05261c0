use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lectern_types::Result;
use rand::Rng;

/// One-time verification codes for educator promotion. A capability
/// interface so deployments can swap the in-process store for a shared
/// expiring key-value store without touching handlers.
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Issue a fresh code for the user, replacing any outstanding one.
    async fn issue(&self, user_id: &str) -> Result<String>;

    /// Check a code. A successful verification consumes the code.
    async fn verify(&self, user_id: &str, code: &str) -> Result<bool>;
}

pub type DynOtpStore = Arc<dyn OtpStore>;

fn generate_code() -> String {
    format!("{:06}", rand::rng().random_range(0..1_000_000))
}

/// TTL-bounded in-process store. Fine for a single instance; multi-instance
/// deployments should enable the `redis` backend instead.
pub struct MemoryOtpStore {
    codes: moka::sync::Cache<String, String>,
}

impl MemoryOtpStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            codes: moka::sync::Cache::builder()
                .max_capacity(10_000)
                .time_to_live(ttl)
                .build(),
        }
    }
}

#[async_trait]
impl OtpStore for MemoryOtpStore {
    async fn issue(&self, user_id: &str) -> Result<String> {
        let code = generate_code();
        self.codes.insert(user_id.to_string(), code.clone());
        Ok(code)
    }

    async fn verify(&self, user_id: &str, code: &str) -> Result<bool> {
        match self.codes.get(user_id) {
            Some(stored) if stored == code => {
                self.codes.invalidate(user_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(feature = "redis")]
pub use redis_store::RedisOtpStore;

#[cfg(feature = "redis")]
mod redis_store {
    use super::*;
    use lectern_types::anyhow;
    use redis::aio::ConnectionManager;

    pub struct RedisOtpStore {
        manager: ConnectionManager,
        ttl: Duration,
    }

    impl RedisOtpStore {
        pub async fn connect(url: &str, ttl: Duration) -> Result<Self> {
            let client =
                redis::Client::open(url).map_err(|e| anyhow!("Invalid Redis URL: {}", e))?;
            let manager = ConnectionManager::new(client)
                .await
                .map_err(|e| anyhow!("Failed to connect to Redis: {}", e))?;
            Ok(Self { manager, ttl })
        }

        fn key(user_id: &str) -> String {
            format!("otp:{user_id}")
        }
    }

    #[async_trait]
    impl OtpStore for RedisOtpStore {
        async fn issue(&self, user_id: &str) -> Result<String> {
            let code = generate_code();
            let mut conn = self.manager.clone();
            redis::cmd("SET")
                .arg(Self::key(user_id))
                .arg(&code)
                .arg("EX")
                .arg(self.ttl.as_secs())
                .query_async::<()>(&mut conn)
                .await
                .map_err(|e| anyhow!("Failed to store code: {}", e))?;
            Ok(code)
        }

        async fn verify(&self, user_id: &str, code: &str) -> Result<bool> {
            let mut conn = self.manager.clone();
            let stored: Option<String> = redis::cmd("GETDEL")
                .arg(Self::key(user_id))
                .query_async(&mut conn)
                .await
                .map_err(|e| anyhow!("Failed to read code: {}", e))?;
            Ok(stored.as_deref() == Some(code))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issued_code_verifies_once() {
        let store = MemoryOtpStore::new(Duration::from_secs(60));
        let code = store.issue("user_1").await.unwrap();
        assert_eq!(code.len(), 6);
        assert!(store.verify("user_1", &code).await.unwrap());
        // Consumed on success
        assert!(!store.verify("user_1", &code).await.unwrap());
    }

    #[tokio::test]
    async fn wrong_code_and_wrong_user_fail() {
        let store = MemoryOtpStore::new(Duration::from_secs(60));
        let code = store.issue("user_1").await.unwrap();
        let wrong = if code == "000000" { "000001" } else { "000000" };
        assert!(!store.verify("user_1", wrong).await.unwrap());
        assert!(!store.verify("user_2", &code).await.unwrap());
        // The right code still works after failed attempts
        assert!(store.verify("user_1", &code).await.unwrap());
    }

    #[tokio::test]
    async fn codes_expire() {
        let store = MemoryOtpStore::new(Duration::from_millis(20));
        let code = store.issue("user_1").await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!store.verify("user_1", &code).await.unwrap());
    }
}
