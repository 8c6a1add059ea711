//! Redis 백엔드.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisResult, Script};
use std::future::Future;
use std::time::Duration;
use tracing::info;

use super::CacheBackend;
use crate::error::{CacheError, Result};

/// SADD 후 TTL이 부족하면(-1 포함) EXPIRE. 서버에서 한 번에 실행됩니다.
const SADD_EXTEND_SCRIPT: &str = r#"
redis.call('SADD', KEYS[1], ARGV[1])
local ttl = tonumber(ARGV[2])
if redis.call('TTL', KEYS[1]) < ttl then
    redis.call('EXPIRE', KEYS[1], ttl)
end
return 1
"#;

/// Redis 연결 래퍼.
///
/// `ConnectionManager`가 끊어진 연결을 자동으로 재수립하며,
/// 모든 명령은 `command_timeout` 안에 끝나지 않으면 타임아웃 오류가 됩니다.
#[derive(Clone)]
pub struct RedisBackend {
    connection: ConnectionManager,
    command_timeout: Duration,
    sadd_extend: Script,
}

impl RedisBackend {
    /// 새로운 Redis 연결을 생성합니다.
    pub async fn connect(
        url: &str,
        connect_timeout: Duration,
        command_timeout: Duration,
    ) -> Result<Self> {
        info!("Connecting to Redis...");

        let client = Client::open(url)?;
        let connection = tokio::time::timeout(connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                CacheError::Timeout(format!("connect after {}ms", connect_timeout.as_millis()))
            })??;

        info!("Redis connection established");

        Ok(Self {
            connection,
            command_timeout,
            sadd_extend: Script::new(SADD_EXTEND_SCRIPT),
        })
    }

    async fn run<T, F, Fut>(&self, command: &str, op: F) -> Result<T>
    where
        F: FnOnce(ConnectionManager) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.command_timeout, op(self.connection.clone())).await {
            Ok(result) => result.map_err(CacheError::from),
            Err(_) => Err(CacheError::Timeout(command.to_string())),
        }
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    fn name(&self) -> &str {
        "redis"
    }

    async fn ping(&self) -> Result<()> {
        let pong: String = self
            .run("PING", |mut conn| async move {
                redis::cmd("PING").query_async(&mut conn).await
            })
            .await?;

        if pong == "PONG" {
            Ok(())
        } else {
            Err(CacheError::Backend(format!("unexpected PING reply: {}", pong)))
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.run("GET", |mut conn| async move { conn.get(key).await })
            .await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        self.run("SETEX", |mut conn| async move {
            conn.set_ex(key, value, ttl_secs).await
        })
        .await
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let keys = keys.to_vec();
        self.run("DEL", |mut conn| async move { conn.del(keys).await })
            .await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.run("EXISTS", |mut conn| async move { conn.exists(key).await })
            .await
    }

    async fn ttl(&self, key: &str) -> Result<i64> {
        self.run("TTL", |mut conn| async move { conn.ttl(key).await })
            .await
    }

    async fn sadd_extend(&self, key: &str, member: &str, ttl_secs: u64) -> Result<()> {
        let script = &self.sadd_extend;
        let _: i64 = self
            .run("EVALSHA", |mut conn| async move {
                script
                    .key(key)
                    .arg(member)
                    .arg(ttl_secs)
                    .invoke_async(&mut conn)
                    .await
            })
            .await?;
        Ok(())
    }

    async fn sunion(&self, keys: &[String]) -> Result<Vec<String>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let keys = keys.to_vec();
        self.run("SUNION", |mut conn| async move { conn.sunion(keys).await })
            .await
    }
}
