use super::scope::{FieldPath, Scope, ScopeId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// 脏字段集合：顶层字段名 → 首次修改前的值快照
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Changes(BTreeMap<&'static str, Value>);

impl Changes {
    /// 字段修改前的值
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 脏字段名（按字段名排序）
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> + '_ {
        self.0.iter().map(|(field, before)| (*field, before))
    }

    /// 以普通 JSON 对象的形式返回，便于断言与日志输出
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(field, before)| (field.to_string(), before.clone()))
                .collect(),
        )
    }
}

/// 单个实体的变更追踪器
///
/// - `changes`：自上次 `commit` 以来的脏字段；
/// - `staged`：打开嵌套视图时为尚未变脏的顶层字段暂存的修改前快照，
///   嵌套写入发生时转入 `changes`；
/// - `scopes`：按字段路径缓存的视图标识，惰性创建，值被替换时失效。
#[derive(Debug, Clone)]
pub struct ChangeTracker {
    changes: Changes,
    staged: HashMap<&'static str, Value>,
    scopes: HashMap<FieldPath, ScopeId>,
    next_scope: u64,
    updated_at: DateTime<Utc>,
}

impl ChangeTracker {
    pub fn new(updated_at: DateTime<Utc>) -> Self {
        Self {
            changes: Changes::default(),
            staged: HashMap::new(),
            scopes: HashMap::new(),
            next_scope: 0,
            updated_at,
        }
    }

    pub fn changes(&self) -> &Changes {
        &self.changes
    }

    pub fn is_dirty(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// 清空脏字段集合（仅在持久化成功后调用）
    pub fn commit(&mut self) {
        if self.is_dirty() {
            tracing::trace!(fields = ?self.changes.keys().collect::<Vec<_>>(), "commit changes");
        }
        self.changes.0.clear();
        self.staged.clear();
    }

    /// 记录根对象的追踪上下文
    pub fn root(&mut self) -> Scope<'_> {
        let path = FieldPath::root();
        let id = self.scope_id(&path);
        Scope::new(self, None, path, id)
    }

    pub(super) fn scope_id(&mut self, path: &FieldPath) -> ScopeId {
        if let Some(id) = self.scopes.get(path) {
            return *id;
        }

        let id = ScopeId::new(self.next_scope);
        self.next_scope += 1;
        self.scopes.insert(path.clone(), id);
        id
    }

    /// 路径上的值被替换后，其自身及所有后代的视图标识失效
    pub(super) fn evict(&mut self, path: &FieldPath) {
        self.scopes.retain(|cached, _| !cached.starts_with(path));
    }

    /// 标记顶层字段为脏；仅首次修改的快照会被保留
    pub(super) fn record(&mut self, field: &'static str, before: impl FnOnce() -> Value) {
        self.staged.remove(field);
        if !self.changes.contains(field) {
            tracing::trace!(field, "field marked dirty");
            self.changes.0.insert(field, before());
        }
    }

    /// 由嵌套写入触发：使用打开视图时暂存的快照标记顶层字段
    pub(super) fn record_staged(&mut self, field: &'static str) {
        let staged = self.staged.remove(field);
        if !self.changes.contains(field) {
            tracing::trace!(field, "field marked dirty by nested write");
            self.changes.0.insert(field, staged.unwrap_or(Value::Null));
        }
    }

    pub(super) fn stage(&mut self, field: &'static str, snapshot: impl FnOnce() -> Value) {
        if !self.changes.contains(field) {
            self.staged.insert(field, snapshot());
        }
    }

    pub(super) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_snapshot_wins_until_commit() {
        let mut tracker = ChangeTracker::new(Utc::now());
        tracker.record("name", || json!("a"));
        tracker.record("name", || json!("b"));

        assert_eq!(tracker.changes().get("name"), Some(&json!("a")));
        assert_eq!(tracker.changes().len(), 1);

        tracker.commit();
        assert!(!tracker.is_dirty());

        tracker.record("name", || json!("b"));
        assert_eq!(tracker.changes().get("name"), Some(&json!("b")));
    }

    #[test]
    fn staged_snapshot_moves_into_changes_on_nested_write() {
        let mut tracker = ChangeTracker::new(Utc::now());
        tracker.stage("profile", || json!({ "age": 1 }));
        assert!(!tracker.is_dirty());

        tracker.record_staged("profile");
        assert_eq!(tracker.changes().to_value(), json!({ "profile": { "age": 1 } }));

        // 已脏字段不会再次暂存
        tracker.stage("profile", || json!({ "age": 2 }));
        tracker.record_staged("profile");
        assert_eq!(tracker.changes().get("profile"), Some(&json!({ "age": 1 })));
    }

    #[test]
    fn scope_ids_are_cached_per_path_and_evicted_with_descendants() {
        let mut tracker = ChangeTracker::new(Utc::now());
        let profile = FieldPath::root().child("profile");
        let address = profile.child("address");

        let profile_id = tracker.scope_id(&profile);
        let address_id = tracker.scope_id(&address);
        assert_eq!(tracker.scope_id(&profile), profile_id);
        assert_ne!(profile_id, address_id);

        tracker.evict(&profile);
        assert_ne!(tracker.scope_id(&profile), profile_id);
        assert_ne!(tracker.scope_id(&address), address_id);
    }

    #[test]
    fn commit_drops_staged_snapshots() {
        let mut tracker = ChangeTracker::new(Utc::now());
        tracker.stage("profile", || json!({ "age": 1 }));
        tracker.commit();

        tracker.record_staged("profile");
        assert_eq!(tracker.changes().get("profile"), Some(&Value::Null));
    }
}
