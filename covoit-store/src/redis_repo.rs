use async_trait::async_trait;
use covoit_core::repository::{LegUsageCache, RepoResult};
use redis::{AsyncCommands, RedisResult};
use tracing::debug;
use uuid::Uuid;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
    /// TTL of cached leg usage entries
    usage_ttl_seconds: u64,
}

fn leg_usage_key(ride_id: Uuid) -> String {
    format!("ride:{}:leg_usage", ride_id)
}

impl RedisClient {
    pub async fn new(connection_string: &str, usage_ttl_seconds: u64) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self {
            client,
            usage_ttl_seconds,
        })
    }

    pub async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, window_seconds)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(count <= limit)
    }
}

#[async_trait]
impl LegUsageCache for RedisClient {
    async fn get_leg_usage(&self, ride_id: Uuid) -> RepoResult<Option<Vec<i32>>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(leg_usage_key(ride_id)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set_leg_usage(&self, ride_id: Uuid, usage: &[i32]) -> RepoResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let json = serde_json::to_string(usage)?;
        conn.set_ex::<_, _, ()>(leg_usage_key(ride_id), json, self.usage_ttl_seconds)
            .await?;
        debug!("Leg usage cached for ride {}", ride_id);
        Ok(())
    }

    async fn invalidate_leg_usage(&self, ride_id: Uuid) -> RepoResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del::<_, ()>(leg_usage_key(ride_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leg_usage_key() {
        let id = Uuid::nil();
        assert_eq!(
            leg_usage_key(id),
            "ride:00000000-0000-0000-0000-000000000000:leg_usage"
        );
    }
}
