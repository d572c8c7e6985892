//! 实体（Entity）
//!
//! 包装一条类型化的数据记录，并提供：
//! - 标识（可注入生成器）、创建/更新时间与 `exists` 持久化标记；
//! - 通过 `data_mut()` 返回的可写视图进行字段级变更追踪（`changes` / `is_dirty` / `commit`）；
//! - 关联结构（`relations`）与普通对象序列化（`to_object` / `to_json`）。
//!
//! 仓储只依赖 `Persistable` 暴露的最小能力面，保存编排见 `persist::RepositoryExt::save`。
//!
use crate::error::{PersistError, PersistResult};
use crate::id::{EntityId, IdGenerator};
use crate::object::{Object, Relations, ToObject, ToObjectOptions, Value};
use crate::record::Record;
use crate::tracking::{ChangeTracker, Changes};
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// 仓储所需的实体能力面
pub trait Persistable: Send + Sync + 'static {
    type Id: EntityId;

    fn id(&self) -> Option<&Self::Id>;

    /// 由后端在创建时回写生成的标识
    fn set_id(&mut self, id: Self::Id);

    /// 是否至少持久化过一次
    fn exists(&self) -> bool;

    fn set_exists(&mut self, exists: bool);

    fn is_dirty(&self) -> bool;

    /// 清空脏字段集合（仅在持久化成功后调用）
    fn commit(&mut self);
}

/// 实体构造参数
#[derive(Builder)]
pub struct EntityOptions<D, R, Id> {
    /// 显式标识，优先于 `id_generator`
    id: Option<Id>,
    id_generator: Option<IdGenerator<Id>>,
    data: D,
    /// `Entity::new` 缺省为 `R::default()`；`Entity::try_new` 要求必填
    relations: Option<R>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    /// 从存储中重建时置为 true
    #[builder(default)]
    exists: bool,
}

/// 带变更追踪的实体
#[derive(Debug, Clone)]
pub struct Entity<D, R = (), Id = String> {
    id: Option<Id>,
    data: D,
    relations: R,
    created_at: DateTime<Utc>,
    exists: bool,
    tracker: ChangeTracker,
}

impl<D, R, Id> Entity<D, R, Id>
where
    D: Record,
    R: Relations,
    Id: EntityId,
{
    /// 缺省关联取 `R::default()`
    pub fn new(mut options: EntityOptions<D, R, Id>) -> Self
    where
        R: Default,
    {
        let relations = options.relations.take().unwrap_or_default();
        Self::assemble(options, relations)
    }

    /// 不要求 `R: Default`，关联必须显式给出
    pub fn try_new(mut options: EntityOptions<D, R, Id>) -> PersistResult<Self> {
        let relations = options.relations.take().ok_or_else(|| PersistError::InvalidValue {
            reason: format!(
                "relations `{}` must be provided explicitly",
                std::any::type_name::<R>()
            ),
        })?;
        Ok(Self::assemble(options, relations))
    }

    fn assemble(options: EntityOptions<D, R, Id>, relations: R) -> Self {
        let EntityOptions {
            id,
            id_generator,
            data,
            relations: _,
            created_at,
            updated_at,
            exists,
        } = options;

        let id = id.or_else(|| id_generator.map(|generate| generate()));
        let now = Utc::now();

        Self {
            id,
            data,
            relations,
            created_at: created_at.unwrap_or(now),
            exists,
            tracker: ChangeTracker::new(updated_at.unwrap_or(now)),
        }
    }

    pub fn id(&self) -> Option<&Id> {
        self.id.as_ref()
    }

    pub fn set_id(&mut self, id: Id) {
        self.id = Some(id);
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn set_exists(&mut self, exists: bool) {
        self.exists = exists;
    }

    /// 只读访问数据记录
    pub fn data(&self) -> &D {
        &self.data
    }

    /// 可写视图：所有写入都会被追踪
    pub fn data_mut(&mut self) -> D::Mut<'_> {
        let scope = self.tracker.root();
        self.data.tracked(scope)
    }

    pub fn relations(&self) -> &R {
        &self.relations
    }

    /// 关联不参与变更追踪，修改不会使实体变脏
    pub fn relations_mut(&mut self) -> &mut R {
        &mut self.relations
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.tracker.updated_at()
    }

    pub fn is_dirty(&self) -> bool {
        self.tracker.is_dirty()
    }

    /// 自上次提交以来的脏字段及其修改前的值
    pub fn changes(&self) -> &Changes {
        self.tracker.changes()
    }

    pub fn commit(&mut self) {
        self.tracker.commit();
    }

    /// 生成普通对象快照：`id`、数据字段、`relations`、`created_at`、`updated_at`
    pub fn to_object(&self, options: &ToObjectOptions) -> PersistResult<Value> {
        let mut object = Object::new();
        object.insert("id".to_string(), serde_json::to_value(&self.id)?);
        object.extend(self.data.to_fields()?);
        object.insert(
            "relations".to_string(),
            Value::Object(self.relations.to_object(options)?),
        );
        object.insert(
            "created_at".to_string(),
            serde_json::to_value(self.created_at)?,
        );
        object.insert(
            "updated_at".to_string(),
            serde_json::to_value(self.updated_at())?,
        );

        Ok(Value::Object(D::filter_object(object, options)))
    }

    /// 以默认视图序列化
    pub fn to_json(&self) -> PersistResult<Value> {
        self.to_object(&ToObjectOptions::default_view())
    }
}

impl<D, R, Id> Persistable for Entity<D, R, Id>
where
    D: Record,
    R: Relations,
    Id: EntityId,
{
    type Id = Id;

    fn id(&self) -> Option<&Id> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: Id) {
        self.id = Some(id);
    }

    fn exists(&self) -> bool {
        self.exists
    }

    fn set_exists(&mut self, exists: bool) {
        self.exists = exists;
    }

    fn is_dirty(&self) -> bool {
        self.tracker.is_dirty()
    }

    fn commit(&mut self) {
        self.tracker.commit();
    }
}

impl<D, R, Id> ToObject for Entity<D, R, Id>
where
    D: Record,
    R: Relations,
    Id: EntityId,
{
    fn to_object(&self, options: &ToObjectOptions) -> PersistResult<Value> {
        Entity::to_object(self, options)
    }
}

impl<D, R, Id> Serialize for Entity<D, R, Id>
where
    D: Record,
    R: Relations,
    Id: EntityId,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<D> From<D> for Entity<D>
where
    D: Record,
{
    fn from(data: D) -> Self {
        Self::new(EntityOptions::builder().data(data).build())
    }
}
