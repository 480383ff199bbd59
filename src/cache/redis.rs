//! Redis cache store using bb8 connection pool.

use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, Script};

use crate::cache::{CacheError, CacheStore};
use crate::config::settings::RedisCacheConfig;

type RedisPool = Pool<Client>;

/// Deletes KEYS[1] only while it still holds ARGV[1].
const REMOVE_IF_EQUALS_SCRIPT: &str = r"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
end
return 0
";

/// Redis-based store with bb8 connection pool.
pub struct RedisStore {
    pool: RedisPool,
    key_prefix: String,
    remove_if_equals: Script,
}

impl RedisStore {
    pub async fn new(config: &RedisCacheConfig) -> Result<Self, CacheError> {
        let client =
            Client::open(config.url.as_str()).map_err(|e| CacheError::Connection(e.to_string()))?;

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(std::time::Duration::from_secs(config.connection_timeout))
            .build(client)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            key_prefix: config.key_prefix.clone(),
            remove_if_equals: Script::new(REMOVE_IF_EQUALS_SCRIPT),
        })
    }

    fn prefixed_key(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.key_prefix, key)
        }
    }

    async fn get_conn(&self) -> Result<PooledConnection<'_, Client>, CacheError> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    fn backend_name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.get_conn().await?;
        let conn_ref: &mut MultiplexedConnection = &mut conn;
        Ok(conn_ref.get(self.prefixed_key(key)).await?)
    }

    async fn set(&self, key: &str, value: String, ttl_seconds: u64) -> Result<(), CacheError> {
        let mut conn = self.get_conn().await?;
        let conn_ref: &mut MultiplexedConnection = &mut conn;
        conn_ref
            .set_ex::<_, _, ()>(self.prefixed_key(key), value, ttl_seconds)
            .await?;
        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: String,
        ttl_seconds: u64,
    ) -> Result<bool, CacheError> {
        let mut conn = self.get_conn().await?;
        let conn_ref: &mut MultiplexedConnection = &mut conn;
        let reply: Option<String> = redis::cmd("SET")
            .arg(self.prefixed_key(key))
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(conn_ref)
            .await?;
        Ok(reply.is_some())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.get_conn().await?;
        let conn_ref: &mut MultiplexedConnection = &mut conn;
        conn_ref.del::<_, ()>(self.prefixed_key(key)).await?;
        Ok(())
    }

    async fn remove_if_equals(&self, key: &str, expected: &str) -> Result<bool, CacheError> {
        let mut conn = self.get_conn().await?;
        let conn_ref: &mut MultiplexedConnection = &mut conn;
        let deleted: i64 = self
            .remove_if_equals
            .key(self.prefixed_key(key))
            .arg(expected)
            .invoke_async(conn_ref)
            .await?;
        Ok(deleted > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.get_conn().await?;
        let conn_ref: &mut MultiplexedConnection = &mut conn;
        Ok(conn_ref.exists(self.prefixed_key(key)).await?)
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>, CacheError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.get_conn().await?;
        let conn_ref: &mut MultiplexedConnection = &mut conn;
        let prefixed: Vec<String> = keys.iter().map(|k| self.prefixed_key(k)).collect();
        Ok(redis::cmd("MGET")
            .arg(prefixed)
            .query_async(conn_ref)
            .await?)
    }

    async fn set_many(
        &self,
        entries: Vec<(String, String)>,
        ttl_seconds: u64,
    ) -> Result<(), CacheError> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for (key, value) in entries {
            pipe.cmd("SET")
                .arg(self.prefixed_key(&key))
                .arg(value)
                .arg("EX")
                .arg(ttl_seconds)
                .ignore();
        }

        let mut conn = self.get_conn().await?;
        let conn_ref: &mut MultiplexedConnection = &mut conn;
        pipe.query_async::<()>(conn_ref).await?;
        Ok(())
    }

    async fn increment(&self, key: &str, ttl_seconds: u64) -> Result<i64, CacheError> {
        let prefixed = self.prefixed_key(key);
        let mut conn = self.get_conn().await?;
        let conn_ref: &mut MultiplexedConnection = &mut conn;
        let (value,): (i64,) = redis::pipe()
            .atomic()
            .cmd("INCR")
            .arg(&prefixed)
            .cmd("EXPIRE")
            .arg(&prefixed)
            .arg(ttl_seconds)
            .ignore()
            .query_async(conn_ref)
            .await
            .map_err(|e| {
                // INCR on a non-numeric value: the caller's mistake, not the backend's
                if e.to_string().contains("not an integer") {
                    CacheError::invalid_argument("value", format!("'{}' does not hold an integer", key))
                } else {
                    CacheError::from(e)
                }
            })?;
        Ok(value)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.get_conn().await?;
        let conn_ref: &mut MultiplexedConnection = &mut conn;
        redis::cmd("PING").query_async::<String>(conn_ref).await?;
        Ok(())
    }
}
