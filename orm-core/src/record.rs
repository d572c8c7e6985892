//! 记录（Record）抽象
//!
//! 实体载荷的类型约束。通常由 `#[record]` 宏生成实现：
//! 为每个字段生成 `set_xxx` / `update_xxx`，为 `#[track(nested)]` 字段生成嵌套视图访问器，
//! 全部写入都经由 `Scope` 完成脏字段判定。
//!
use crate::error::{PersistError, PersistResult};
use crate::object::{Object, ToObjectOptions};
use crate::tracking::Scope;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

/// 可被实体追踪的数据记录
pub trait Record: Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// 顶层字段名（与序列化后的键一致）
    const FIELDS: &'static [&'static str];

    /// 追踪写入的可写视图
    type Mut<'a>
    where
        Self: 'a;

    /// 以给定追踪上下文构造可写视图
    fn tracked<'a>(&'a mut self, scope: Scope<'a>) -> Self::Mut<'a>;

    /// 序列化钩子：按视图（`options.view()`）裁剪输出，默认不做过滤
    fn filter_object(object: Object, options: &ToObjectOptions) -> Object {
        let _ = options;
        object
    }

    /// 将记录展开为 "字段名 → 值" 的普通对象
    fn to_fields(&self) -> PersistResult<Object> {
        match serde_json::to_value(self)? {
            Value::Object(fields) => Ok(fields),
            other => Err(PersistError::InvalidValue {
                reason: format!("record must serialize to an object, got `{other}`"),
            }),
        }
    }
}
