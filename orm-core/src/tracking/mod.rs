//! 变更追踪（tracking）
//!
//! 实体内部的脏字段簿记：
//! - `ChangeTracker`：记录"自上次提交以来被修改的顶层字段 → 修改前的值"，并维护 `updated_at`；
//! - `Scope`：生成的可写视图（`#[record]`）持有的追踪上下文，所有 setter 都经由
//!   `Scope::assign` / `Scope::update` 判定是否结构性变化并标记所属顶层字段；
//! - `FieldPath` / `ScopeId`：嵌套视图按字段路径缓存的稳定标识。
//!
//! 追踪器归属于单个实体实例，生命周期与实体一致，不存在跨实体共享的状态。
//!
mod change_tracker;
mod scope;

pub use change_tracker::{ChangeTracker, Changes};
pub use scope::{FieldPath, Scope, ScopeId};
