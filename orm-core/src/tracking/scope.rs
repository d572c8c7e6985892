use super::change_tracker::ChangeTracker;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// 从记录根出发的字段路径，例如 `profile.address`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<&'static str>);

impl FieldPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn child(&self, field: &'static str) -> Self {
        let mut segments = self.0.clone();
        segments.push(field);
        Self(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// 路径所属的顶层字段
    pub fn owner(&self) -> Option<&'static str> {
        self.0.first().copied()
    }

    pub fn segments(&self) -> &[&'static str] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("$");
        }
        f.write_str(&self.0.join("."))
    }
}

/// 视图标识：同一路径上的同一对象始终得到相同的标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

impl ScopeId {
    pub(super) fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// 可写视图的追踪上下文
///
/// 根视图的 `owner` 为空，写入的字段本身即顶层字段；
/// 嵌套视图继承其所属的顶层字段，所有深层写入都归属到该字段。
pub struct Scope<'a> {
    tracker: &'a mut ChangeTracker,
    owner: Option<&'static str>,
    path: FieldPath,
    id: ScopeId,
}

impl<'a> Scope<'a> {
    pub(super) fn new(
        tracker: &'a mut ChangeTracker,
        owner: Option<&'static str>,
        path: FieldPath,
        id: ScopeId,
    ) -> Self {
        Self {
            tracker,
            owner,
            path,
            id,
        }
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// 写入所归属的顶层字段；根视图返回 `None`
    pub fn owner(&self) -> Option<&'static str> {
        self.owner
    }

    /// 赋值并在结构性变化时标记脏字段，返回是否记录了变化
    ///
    /// 相等的值同样会被写入，但不标记、不刷新 `updated_at`。
    pub fn assign<T>(&mut self, field: &'static str, slot: &mut T, value: T) -> bool
    where
        T: PartialEq + Serialize,
    {
        if *slot == value {
            *slot = value;
            return false;
        }

        self.mark(field, slot);
        *slot = value;
        true
    }

    /// 原地修改（集合、Option 等），以修改前后的比较结果决定是否标记
    pub fn update<T, F>(&mut self, field: &'static str, slot: &mut T, f: F) -> bool
    where
        T: Clone + PartialEq + Serialize,
        F: FnOnce(&mut T),
    {
        let before = slot.clone();
        f(slot);
        if *slot == before {
            return false;
        }

        self.mark(field, &before);
        true
    }

    /// 进入嵌套记录的追踪上下文
    ///
    /// 从根视图进入且该顶层字段尚未变脏时，先暂存其当前值作为"修改前"快照。
    pub fn nest<T>(&mut self, field: &'static str, current: &T) -> Scope<'_>
    where
        T: Serialize + ?Sized,
    {
        let owner = match self.owner {
            Some(owner) => owner,
            None => {
                self.tracker.stage(field, || snapshot(field, current));
                field
            }
        };
        let path = self.path.child(field);
        let id = self.tracker.scope_id(&path);

        Scope::new(&mut *self.tracker, Some(owner), path, id)
    }

    fn mark<T>(&mut self, field: &'static str, before: &T)
    where
        T: Serialize + ?Sized,
    {
        match self.owner {
            None => self.tracker.record(field, || snapshot(field, before)),
            Some(owner) => self.tracker.record_staged(owner),
        }
        self.tracker.evict(&self.path.child(field));
        self.tracker.touch();
    }
}

fn snapshot<T>(field: &'static str, value: &T) -> Value
where
    T: Serialize + ?Sized,
{
    serde_json::to_value(value).unwrap_or_else(|err| {
        tracing::warn!(field, error = %err, "field value is not serializable, recording null");
        Value::Null
    })
}
