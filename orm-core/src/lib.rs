//! 带变更追踪的实体与脏字段感知仓储（orm-core）
//!
//! 提供轻量 ORM 的领域侧构件：
//! - 实体（`entity`）：包装类型化记录，维护标识、时间戳、`exists` 标记与脏字段集合
//! - 变更追踪（`tracking`）：经由可写视图的字段写入，嵌套记录的写入归属到顶层字段
//! - 记录约束（`record`）与普通对象序列化（`object`），配合 `#[record]` / `#[relations]` 宏使用
//! - 实体集合（`entity_group`）
//! - 仓储（`persist`）：后端契约、按状态分派的 `save` 与内存参考实现
//!
//! 典型用法：
//! 1. 用 `#[record]` 定义数据记录，必要时用 `#[track(nested)]` 标注嵌套记录字段；
//! 2. 通过 `EntityOptions::builder()` 构造 `Entity`，经 `data_mut()` 写入字段；
//! 3. 为存储后端实现 `Repository`，调用 `RepositoryExt::save` 完成创建或增量更新。
//!
pub mod entity;
pub mod entity_group;
pub mod error;
pub mod id;
pub mod object;
pub mod persist;
pub mod record;
pub mod tracking;

pub use entity::{Entity, EntityOptions, Persistable};
pub use entity_group::EntityGroup;
pub use error::{PersistError, PersistResult};
pub use record::Record;

// 允许在本 crate 内部通过 ::orm_core 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::orm_core 路径。
extern crate self as orm_core;
