//! 实体集合（EntityGroup）
//!
//! 有序、可索引的实体序列，按标识的字符串形式查找/移除；不强制标识唯一。
//!
use crate::entity::Persistable;
use crate::error::PersistResult;
use crate::object::{ToObject, ToObjectOptions, Value};
use serde::{Serialize, Serializer};
use std::fmt::Display;
use std::ops::{Deref, DerefMut};

#[derive(Debug, Clone)]
pub struct EntityGroup<E> {
    items: Vec<E>,
}

impl<E> Default for EntityGroup<E> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<E> EntityGroup<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// 追加实体，支持链式调用
    pub fn add(&mut self, items: impl IntoIterator<Item = E>) -> &mut Self {
        self.items.extend(items);
        self
    }

    pub fn into_inner(self) -> Vec<E> {
        self.items
    }
}

impl<E: Persistable> EntityGroup<E> {
    /// 按标识的字符串形式查找第一个匹配项
    pub fn find_by_id(&self, id: impl Display) -> Option<&E> {
        let needle = id.to_string();
        self.items.iter().find(|item| has_id(*item, &needle))
    }

    pub fn find_by_id_mut(&mut self, id: impl Display) -> Option<&mut E> {
        let needle = id.to_string();
        self.items.iter_mut().find(|item| has_id(&**item, &needle))
    }

    /// 移除第一个匹配项，返回是否移除
    pub fn remove_by_id(&mut self, id: impl Display) -> bool {
        let needle = id.to_string();
        match self.items.iter().position(|item| has_id(item, &needle)) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }
}

fn has_id<E: Persistable>(item: &E, needle: &str) -> bool {
    item.id().is_some_and(|id| id.to_string() == needle)
}

impl<E: ToObject> EntityGroup<E> {
    pub fn to_object(&self, options: &ToObjectOptions) -> PersistResult<Value> {
        self.items.to_object(options)
    }

    pub fn to_json(&self) -> PersistResult<Value> {
        self.to_object(&ToObjectOptions::default_view())
    }
}

impl<E: ToObject> ToObject for EntityGroup<E> {
    fn to_object(&self, options: &ToObjectOptions) -> PersistResult<Value> {
        EntityGroup::to_object(self, options)
    }
}

impl<E: ToObject> Serialize for EntityGroup<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<E> Deref for EntityGroup<E> {
    type Target = Vec<E>;

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl<E> DerefMut for EntityGroup<E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.items
    }
}

impl<E> From<Vec<E>> for EntityGroup<E> {
    fn from(items: Vec<E>) -> Self {
        Self { items }
    }
}

impl<E> FromIterator<E> for EntityGroup<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<E> Extend<E> for EntityGroup<E> {
    fn extend<I: IntoIterator<Item = E>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<E> IntoIterator for EntityGroup<E> {
    type Item = E;
    type IntoIter = std::vec::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, E> IntoIterator for &'a EntityGroup<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
