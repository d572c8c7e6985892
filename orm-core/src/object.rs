//! 普通对象序列化（to_object / to_json）
//!
//! - `ToObject`：能把自身转换为普通 JSON 值的能力接口，由 `Entity`、`EntityGroup`
//!   以及 `Option` / `Vec` / `Box` / `Arc` / `Value` 与常见标量实现，关联关系按此接口递归序列化；
//! - `Relations`：实体的关联结构，通常由 `#[relations]` 宏生成；
//! - `ToObjectOptions`：序列化配置，包含 `view` 与任意额外键，原样传递给 `Record::filter_object`。
//!
use crate::error::PersistResult;
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub use serde_json::Value;

/// 普通 JSON 对象
pub type Object = serde_json::Map<String, Value>;

/// 序列化配置
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
pub struct ToObjectOptions {
    /// 视图名称（例如 `default`、`public`）
    #[builder(into)]
    view: Option<String>,
    /// 额外的自由键，原样传递给过滤钩子
    #[builder(default)]
    #[serde(flatten)]
    extra: Object,
}

impl ToObjectOptions {
    pub const DEFAULT_VIEW: &'static str = "default";

    /// `to_json` 使用的默认视图配置
    pub fn default_view() -> Self {
        Self::view_named(Self::DEFAULT_VIEW)
    }

    pub fn view_named(view: impl Into<String>) -> Self {
        Self {
            view: Some(view.into()),
            extra: Object::new(),
        }
    }

    pub fn view(&self) -> Option<&str> {
        self.view.as_deref()
    }

    pub fn extra(&self) -> &Object {
        &self.extra
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// 追加一个额外键
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// 转换为普通 JSON 值的能力
pub trait ToObject {
    fn to_object(&self, options: &ToObjectOptions) -> PersistResult<Value>;
}

impl ToObject for Value {
    fn to_object(&self, _options: &ToObjectOptions) -> PersistResult<Value> {
        Ok(self.clone())
    }
}

// 标量关联（计数、外键等）直接按 serde 输出
macro_rules! scalar_to_object {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToObject for $ty {
                fn to_object(&self, _options: &ToObjectOptions) -> PersistResult<Value> {
                    Ok(serde_json::to_value(self)?)
                }
            }
        )*
    };
}

scalar_to_object!(
    bool,
    char,
    String,
    str,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    DateTime<Utc>,
);

// 缺失的关联原样输出为 null
impl<T: ToObject> ToObject for Option<T> {
    fn to_object(&self, options: &ToObjectOptions) -> PersistResult<Value> {
        match self {
            Some(inner) => inner.to_object(options),
            None => Ok(Value::Null),
        }
    }
}

impl<T: ToObject> ToObject for Vec<T> {
    fn to_object(&self, options: &ToObjectOptions) -> PersistResult<Value> {
        self.iter()
            .map(|item| item.to_object(options))
            .collect::<PersistResult<Vec<_>>>()
            .map(Value::Array)
    }
}

impl<T: ToObject + ?Sized> ToObject for Box<T> {
    fn to_object(&self, options: &ToObjectOptions) -> PersistResult<Value> {
        (**self).to_object(options)
    }
}

impl<T: ToObject + ?Sized> ToObject for Arc<T> {
    fn to_object(&self, options: &ToObjectOptions) -> PersistResult<Value> {
        (**self).to_object(options)
    }
}

/// 实体的关联结构（不参与脏字段追踪）
pub trait Relations: Send + Sync + 'static {
    fn to_object(&self, options: &ToObjectOptions) -> PersistResult<Object>;
}

impl Relations for () {
    fn to_object(&self, _options: &ToObjectOptions) -> PersistResult<Object> {
        Ok(Object::new())
    }
}

/// 动态关联：以名称为键
impl<T> Relations for BTreeMap<String, T>
where
    T: ToObject + Send + Sync + 'static,
{
    fn to_object(&self, options: &ToObjectOptions) -> PersistResult<Object> {
        self.iter()
            .map(|(name, related)| {
                related
                    .to_object(options)
                    .map(|value| (name.clone(), value))
            })
            .collect()
    }
}
