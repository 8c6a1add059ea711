//! 프로세스 로컬 메모리 백엔드.
//!
//! Redis 없이 실행하는 배포와 테스트에서 사용합니다. 만료는 접근 시점에
//! 지연 정리되며, 시간은 `tokio::time::Instant`를 따르므로
//! `tokio::time::pause`로 제어할 수 있습니다.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use super::CacheBackend;
use crate::error::{CacheError, Result};

#[derive(Debug, Clone)]
enum MemoryValue {
    Text(String),
    Set(BTreeSet<String>),
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: MemoryValue,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// 메모리 백엔드.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

fn wrong_type(key: &str) -> CacheError {
    CacheError::Backend(format!(
        "WRONGTYPE Operation against a key holding the wrong kind of value: {}",
        key
    ))
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, MemoryEntry>>> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Backend("memory backend lock poisoned".to_string()))
    }

    /// 만료된 항목을 제거한 뒤 살아있는 항목에 대해 `f`를 실행합니다.
    fn with_live<T>(
        &self,
        key: &str,
        f: impl FnOnce(Option<&mut MemoryEntry>) -> Result<T>,
    ) -> Result<T> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }
        f(entries.get_mut(key))
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn ping(&self) -> Result<()> {
        self.lock().map(|_| ())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_live(key, |entry| match entry {
            None => Ok(None),
            Some(MemoryEntry {
                value: MemoryValue::Text(text),
                ..
            }) => Ok(Some(text.clone())),
            Some(_) => Err(wrong_type(key)),
        })
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let mut entries = self.lock()?;
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: MemoryValue::Text(value.to_string()),
                expires_at: Some(Instant::now() + Duration::from_secs(ttl_secs)),
            },
        );
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        let mut deleted = 0;
        for key in keys {
            if let Some(entry) = entries.remove(key) {
                if !entry.is_expired(now) {
                    deleted += 1;
                }
            }
        }
        Ok(deleted)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.with_live(key, |entry| Ok(entry.is_some()))
    }

    async fn ttl(&self, key: &str) -> Result<i64> {
        self.with_live(key, |entry| {
            Ok(match entry {
                None => -2,
                Some(MemoryEntry {
                    expires_at: None, ..
                }) => -1,
                Some(MemoryEntry {
                    expires_at: Some(at),
                    ..
                }) => {
                    // Redis처럼 초 단위로 올림
                    let remaining = at.saturating_duration_since(Instant::now()).as_millis();
                    remaining.div_ceil(1000) as i64
                }
            })
        })
    }

    async fn sadd_extend(&self, key: &str, member: &str, ttl_secs: u64) -> Result<()> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }
        let entry = entries.entry(key.to_string()).or_insert_with(|| MemoryEntry {
            value: MemoryValue::Set(BTreeSet::new()),
            expires_at: None,
        });
        let MemoryValue::Set(members) = &mut entry.value else {
            return Err(wrong_type(key));
        };
        members.insert(member.to_string());

        let wanted = now + Duration::from_secs(ttl_secs);
        if entry.expires_at.map_or(true, |at| at < wanted) {
            entry.expires_at = Some(wanted);
        }
        Ok(())
    }

    async fn sunion(&self, keys: &[String]) -> Result<Vec<String>> {
        let entries = self.lock()?;
        let now = Instant::now();
        let mut union = BTreeSet::new();
        for key in keys {
            match entries.get(key) {
                Some(entry) if entry.is_expired(now) => {}
                Some(MemoryEntry {
                    value: MemoryValue::Set(members),
                    ..
                }) => union.extend(members.iter().cloned()),
                Some(_) => return Err(wrong_type(key)),
                None => {}
            }
        }
        Ok(union.into_iter().collect())
    }
}
