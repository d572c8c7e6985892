//! 实体标识（Id）与标识生成器
//!
//! 标识类型只需满足 `EntityId` 的约束即可（`String`、整数、`Uuid` 或 `#[entity_id]` 包装类型），
//! 生成器以 `IdGenerator` 注入到 `EntityOptions` 或后端仓储中。
//!
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::{Debug, Display};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// 可作为实体标识的类型
pub trait EntityId:
    Clone + Debug + Display + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> EntityId for T where
    T: Clone + Debug + Display + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// 标识生成器
pub type IdGenerator<Id> = Arc<dyn Fn() -> Id + Send + Sync>;

/// 将任意闭包包装为 `IdGenerator`
pub fn id_generator<Id, F>(f: F) -> IdGenerator<Id>
where
    F: Fn() -> Id + Send + Sync + 'static,
{
    Arc::new(f)
}

/// 自增整数标识生成器，从 `start` 开始
pub fn sequential(start: u64) -> IdGenerator<u64> {
    let next = AtomicU64::new(start);
    Arc::new(move || next.fetch_add(1, Ordering::Relaxed))
}

/// UUID v4 字符串标识生成器
#[cfg(feature = "uuid")]
pub fn uuid_v4() -> IdGenerator<String> {
    Arc::new(|| uuid::Uuid::new_v4().to_string())
}
