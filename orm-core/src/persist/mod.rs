//! 持久化（persist）
//!
//! - `Repository`：后端契约（`create` / `update` / `delete`），经 `Arc<T>` 透明转发；
//! - `RepositoryExt::save`：按实体状态（未持久化 / 干净 / 脏）分派到后端，成功后提交脏字段；
//! - `InMemoryRepository`：以 `StoredRecord` 保存快照的参考后端。
//!
//! 具体存储后端（如数据库）由上层实现 `Repository` 并注入。
//!
mod in_memory;
mod repository;
mod stored_record;

pub use in_memory::InMemoryRepository;
pub use repository::{Repository, RepositoryExt};
pub use stored_record::StoredRecord;
