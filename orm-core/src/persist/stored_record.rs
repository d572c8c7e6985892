use crate::entity::{Entity, EntityOptions};
use crate::error::{PersistError, PersistResult};
use crate::id::EntityId;
use crate::object::{Object, Relations, Value};
use crate::record::Record;
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 后端存储的实体快照：标识、数据字段与时间戳（关联不入库）
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct StoredRecord {
    id: Value,
    data: Object,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StoredRecord {
    pub fn id(&self) -> &Value {
        &self.id
    }

    pub fn data(&self) -> &Object {
        &self.data
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// 标识相等判断，以序列化后的值比较
    pub fn matches<Id: EntityId>(&self, id: &Id) -> PersistResult<bool> {
        Ok(self.id == serde_json::to_value(id)?)
    }

    /// 合并部分字段并刷新 `updated_at`
    pub fn merge(&mut self, fields: Object, updated_at: DateTime<Utc>) {
        self.data.extend(fields);
        self.updated_at = updated_at;
    }

    /// 从实体生成完整快照；实体必须已有标识
    pub fn from_entity<D, R, Id>(entity: &Entity<D, R, Id>) -> PersistResult<Self>
    where
        D: Record,
        R: Relations,
        Id: EntityId,
    {
        let id = entity.id().ok_or(PersistError::MissingId)?;
        Self::from_entity_with_id(entity, id)
    }

    /// 以给定标识生成快照，实体自身的标识不参与
    pub fn from_entity_with_id<D, R, Id>(entity: &Entity<D, R, Id>, id: &Id) -> PersistResult<Self>
    where
        D: Record,
        R: Relations,
        Id: EntityId,
    {
        Ok(Self {
            id: serde_json::to_value(id)?,
            data: entity.data().to_fields()?,
            created_at: entity.created_at(),
            updated_at: entity.updated_at(),
        })
    }

    /// 重建实体：`exists` 为 true，脏字段为空
    pub fn to_entity<D, R, Id>(&self) -> PersistResult<Entity<D, R, Id>>
    where
        D: Record,
        R: Relations + Default,
        Id: EntityId,
    {
        let id: Id = serde_json::from_value(self.id.clone())?;
        let data: D = serde_json::from_value(Value::Object(self.data.clone()))?;

        Ok(Entity::new(
            EntityOptions::builder()
                .id(id)
                .data(data)
                .created_at(self.created_at)
                .updated_at(self.updated_at)
                .exists(true)
                .build(),
        ))
    }
}
