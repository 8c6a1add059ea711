//! 캐시 키 생성.
//!
//! 키는 `:`로 연결된 세그먼트입니다. 스칼라는 그대로 문자열화하고
//! (구분자와 `%`만 이스케이프), 객체/배열은 키를 정렬한 정규 JSON의
//! SHA-256 앞 16바이트를 hex로 인코딩한 fingerprint로 줄입니다.
//!
//! ```
//! use trader_cache::cache_key;
//!
//! assert_eq!(cache_key!("user", 123, "profile").as_str(), "user:123:profile");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;

use crate::error::Result;

/// 세그먼트 구분자.
pub const KEY_SEPARATOR: char = ':';

/// fingerprint로 사용하는 digest 바이트 수 (hex 32자).
const FINGERPRINT_BYTES: usize = 16;

/// 정규화된 캐시 키.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for CacheKey {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}

/// 키 세그먼트 하나.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyPart {
    Text(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    /// 객체/배열은 fingerprint, JSON 스칼라는 스칼라와 같은 규칙
    Structured(Value),
}

impl KeyPart {
    /// 직렬화 가능한 값을 구조체 세그먼트로 변환합니다.
    pub fn structured<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(KeyPart::Structured(serde_json::to_value(value)?))
    }

    fn segment(&self) -> String {
        match self {
            KeyPart::Text(s) => escape_scalar(s).into_owned(),
            KeyPart::Int(n) => n.to_string(),
            KeyPart::UInt(n) => n.to_string(),
            KeyPart::Float(n) => n.to_string(),
            KeyPart::Bool(b) => b.to_string(),
            KeyPart::Structured(value) => match value {
                Value::Object(_) | Value::Array(_) => fingerprint(value),
                Value::String(s) => escape_scalar(s).into_owned(),
                other => other.to_string(),
            },
        }
    }
}

impl From<&str> for KeyPart {
    fn from(s: &str) -> Self {
        KeyPart::Text(s.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(s: String) -> Self {
        KeyPart::Text(s)
    }
}

impl From<&String> for KeyPart {
    fn from(s: &String) -> Self {
        KeyPart::Text(s.clone())
    }
}

impl From<i32> for KeyPart {
    fn from(n: i32) -> Self {
        KeyPart::Int(n as i64)
    }
}

impl From<i64> for KeyPart {
    fn from(n: i64) -> Self {
        KeyPart::Int(n)
    }
}

impl From<u32> for KeyPart {
    fn from(n: u32) -> Self {
        KeyPart::UInt(n as u64)
    }
}

impl From<u64> for KeyPart {
    fn from(n: u64) -> Self {
        KeyPart::UInt(n)
    }
}

impl From<usize> for KeyPart {
    fn from(n: usize) -> Self {
        KeyPart::UInt(n as u64)
    }
}

impl From<f64> for KeyPart {
    fn from(n: f64) -> Self {
        KeyPart::Float(n)
    }
}

impl From<bool> for KeyPart {
    fn from(b: bool) -> Self {
        KeyPart::Bool(b)
    }
}

impl From<Value> for KeyPart {
    fn from(value: Value) -> Self {
        KeyPart::Structured(value)
    }
}

impl From<&Value> for KeyPart {
    fn from(value: &Value) -> Self {
        KeyPart::Structured(value.clone())
    }
}

/// 세그먼트 목록으로 캐시 키를 생성합니다.
///
/// 빈 목록이면 빈 키가 반환됩니다.
pub fn generate_key(parts: &[KeyPart]) -> CacheKey {
    let segments: Vec<String> = parts.iter().map(KeyPart::segment).collect();
    CacheKey(segments.join(&KEY_SEPARATOR.to_string()))
}

/// 구조체 값의 fingerprint.
///
/// 객체 키 순서와 무관하게 논리적으로 같은 값은 같은 fingerprint를 갖습니다.
pub fn fingerprint(value: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(value, &mut canonical);
    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (k, v)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(k.clone()).to_string());
                out.push(':');
                write_canonical(v, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn escape_scalar(s: &str) -> Cow<'_, str> {
    if s.contains(['%', KEY_SEPARATOR]) {
        Cow::Owned(s.replace('%', "%25").replace(KEY_SEPARATOR, "%3A"))
    } else {
        Cow::Borrowed(s)
    }
}

/// 여러 타입의 세그먼트로 캐시 키를 생성하는 매크로.
#[macro_export]
macro_rules! cache_key {
    ($($part:expr),* $(,)?) => {
        $crate::key::generate_key(&[$($crate::key::KeyPart::from($part)),*])
    };
}
