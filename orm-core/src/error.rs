//! 持久化层统一错误定义
//!
//! 聚焦序列化、标识缺失、仓储读写与值校验等最小必要集合；
//! 后端实现可直接使用 `PersistError`，也可通过 `Repository::Error` 声明自有错误类型。
//!
use thiserror::Error;

/// 统一错误类型（基础库最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PersistError {
    // --- 序列化 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
    #[error("invalid value: {reason}")]
    InvalidValue { reason: String },

    // --- 标识 ---
    #[error("entity has no id and the backend cannot assign one")]
    MissingId,

    // --- 仓储/持久化 ---
    #[error("record not found: id={id}")]
    NotFound { id: String },
    #[error("repository lock poisoned during {operation}")]
    LockPoisoned { operation: &'static str },
    #[error("repository error: {reason}")]
    Repository { reason: String },
}

/// 统一 Result 类型别名
pub type PersistResult<T> = Result<T, PersistError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_error_converts_with_question_mark() {
        fn parse(raw: &str) -> PersistResult<serde_json::Value> {
            Ok(serde_json::from_str(raw)?)
        }

        let err = parse("{not json").unwrap_err();
        assert!(matches!(err, PersistError::Serde { .. }));
        assert!(err.to_string().starts_with("serialization error"));
    }

    #[test]
    fn not_found_message_carries_id() {
        let err = PersistError::NotFound { id: "u-1".into() };
        assert_eq!(err.to_string(), "record not found: id=u-1");
    }
}
