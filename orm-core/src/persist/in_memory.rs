//! 内存仓储
//!
//! 参考后端：按插入顺序保存 `StoredRecord`，线性查找；
//! 锁只在同步辅助函数内持有，不会跨越 `.await`。
//!
use super::{Repository, StoredRecord};
use crate::entity::Entity;
use crate::error::{PersistError, PersistResult};
use crate::id::{EntityId, IdGenerator};
use crate::object::{Object, Relations};
use crate::record::Record;
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub struct InMemoryRepository<D, R = (), Id = String> {
    items: RwLock<Vec<StoredRecord>>,
    id_generator: Option<IdGenerator<Id>>,
    _marker: PhantomData<fn() -> (D, R)>,
}

impl<D, R, Id> Default for InMemoryRepository<D, R, Id> {
    fn default() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            id_generator: None,
            _marker: PhantomData,
        }
    }
}

impl<D, R, Id> InMemoryRepository<D, R, Id>
where
    D: Record,
    R: Relations,
    Id: EntityId,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// 为无标识的实体在 `create` 时分配标识
    pub fn with_id_generator(id_generator: IdGenerator<Id>) -> Self {
        Self {
            id_generator: Some(id_generator),
            ..Self::default()
        }
    }

    /// 当前存储内容的拷贝（按插入顺序）
    pub fn records(&self) -> PersistResult<Vec<StoredRecord>> {
        Ok(self.read("records")?.clone())
    }

    pub fn len(&self) -> PersistResult<usize> {
        Ok(self.read("len")?.len())
    }

    pub fn is_empty(&self) -> PersistResult<bool> {
        Ok(self.read("is_empty")?.is_empty())
    }

    pub fn find(&self, id: &Id) -> PersistResult<Option<StoredRecord>> {
        let items = self.read("find")?;
        for item in items.iter() {
            if item.matches(id)? {
                return Ok(Some(item.clone()));
            }
        }
        Ok(None)
    }

    /// 从存储重建实体（`exists` 为 true，无脏字段）
    pub fn load(&self, id: &Id) -> PersistResult<Option<Entity<D, R, Id>>>
    where
        R: Default,
    {
        self.find(id)?
            .map(|stored| stored.to_entity())
            .transpose()
    }

    pub fn clear(&self) -> PersistResult<()> {
        self.write("clear")?.clear();
        Ok(())
    }

    fn read(&self, operation: &'static str) -> PersistResult<RwLockReadGuard<'_, Vec<StoredRecord>>> {
        self.items
            .read()
            .map_err(|_| PersistError::LockPoisoned { operation })
    }

    fn write(
        &self,
        operation: &'static str,
    ) -> PersistResult<RwLockWriteGuard<'_, Vec<StoredRecord>>> {
        self.items
            .write()
            .map_err(|_| PersistError::LockPoisoned { operation })
    }

    fn insert(&self, entity: &mut Entity<D, R, Id>) -> PersistResult<()> {
        // 生成的标识在写入成功后才回写到实体
        let generated = match entity.id() {
            Some(_) => None,
            None => {
                let generate = self.id_generator.as_ref().ok_or(PersistError::MissingId)?;
                Some(generate())
            }
        };

        let stored = match &generated {
            Some(id) => StoredRecord::from_entity_with_id(entity, id)?,
            None => StoredRecord::from_entity(entity)?,
        };
        tracing::debug!(id = %stored.id(), "in-memory create");
        self.write("create")?.push(stored);

        if let Some(id) = generated {
            entity.set_id(id);
        }
        Ok(())
    }

    fn merge_changes(&self, entity: &Entity<D, R, Id>) -> PersistResult<()> {
        let id = entity.id().ok_or(PersistError::MissingId)?;
        let fields = entity.data().to_fields()?;
        // 脏字段必须能在序列化结果中找到，否则更新会被静默丢弃
        let changed = entity
            .changes()
            .keys()
            .map(|field| match fields.get(field) {
                Some(value) => Ok((field.to_string(), value.clone())),
                None => Err(PersistError::InvalidValue {
                    reason: format!("changed field `{field}` is missing from the serialized record"),
                }),
            })
            .collect::<PersistResult<Object>>()?;

        let mut items = self.write("update")?;
        let mut target = None;
        for (index, item) in items.iter().enumerate() {
            if item.matches(id)? {
                target = Some(index);
                break;
            }
        }
        let index = target.ok_or_else(|| PersistError::NotFound { id: id.to_string() })?;

        tracing::debug!(%id, fields = ?changed.keys().collect::<Vec<_>>(), "in-memory update");
        items[index].merge(changed, entity.updated_at());
        Ok(())
    }

    fn remove(&self, id: &Id) -> PersistResult<bool> {
        let mut items = self.write("delete")?;
        let mut target = None;
        for (index, item) in items.iter().enumerate() {
            if item.matches(id)? {
                target = Some(index);
                break;
            }
        }

        tracing::debug!(%id, found = target.is_some(), "in-memory delete");
        Ok(match target {
            Some(index) => {
                items.remove(index);
                true
            }
            None => false,
        })
    }
}

#[async_trait]
impl<D, R, Id> Repository<Entity<D, R, Id>> for InMemoryRepository<D, R, Id>
where
    D: Record,
    R: Relations,
    Id: EntityId,
{
    type Error = PersistError;

    async fn create(&self, entity: &mut Entity<D, R, Id>) -> Result<(), Self::Error> {
        self.insert(entity)
    }

    async fn update(&self, entity: &mut Entity<D, R, Id>) -> Result<(), Self::Error> {
        self.merge_changes(entity)
    }

    async fn delete(&self, id: &Id) -> Result<bool, Self::Error> {
        self.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityOptions;
    use crate::id::sequential;
    use crate::persist::RepositoryExt;
    use crate::tracking::Scope;
    use orm_macros::record;
    use serde_json::json;
    use std::panic::{self, AssertUnwindSafe};

    #[record]
    struct Account {
        name: String,
        balance: i64,
    }

    #[record]
    #[serde(rename_all = "camelCase")]
    struct Person {
        full_name: String,
    }

    // 手写实现：`note` 为 None 时不出现在序列化结果中
    #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Memo {
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    }

    impl Record for Memo {
        const FIELDS: &'static [&'static str] = &["note"];

        type Mut<'a> = (&'a mut Memo, Scope<'a>);

        fn tracked<'a>(&'a mut self, scope: Scope<'a>) -> Self::Mut<'a> {
            (self, scope)
        }
    }

    fn account(name: &str) -> Account {
        Account {
            name: name.into(),
            balance: 0,
        }
    }

    #[tokio::test]
    async fn create_without_id_or_generator_is_rejected() {
        let repo: InMemoryRepository<Account> = InMemoryRepository::new();
        let mut entity = Entity::from(account("a"));

        let err = repo.save(&mut entity).await.unwrap_err();
        assert!(matches!(err, PersistError::MissingId));
        assert!(!entity.exists());
        assert!(repo.is_empty().unwrap());
    }

    #[tokio::test]
    async fn generator_assigns_and_writes_back_id() {
        let repo: InMemoryRepository<Account, (), u64> =
            InMemoryRepository::with_id_generator(sequential(100));
        let mut entity = Entity::new(EntityOptions::builder().data(account("a")).build());

        repo.save(&mut entity).await.unwrap();

        assert_eq!(entity.id(), Some(&100));
        assert!(entity.exists());
        assert_eq!(repo.records().unwrap()[0].id(), &json!(100));
    }

    #[tokio::test]
    async fn update_merges_only_changed_fields() {
        let repo: InMemoryRepository<Account> = InMemoryRepository::new();
        let mut entity = Entity::new(
            EntityOptions::builder()
                .id("acc-1".to_string())
                .data(account("a"))
                .build(),
        );
        repo.save(&mut entity).await.unwrap();

        // 直接篡改存储中的未变更字段，验证 update 不会覆盖它
        {
            let mut items = repo.items.write().unwrap();
            let mut untouched = Object::new();
            untouched.insert("name".into(), json!("stored"));
            let updated_at = items[0].updated_at();
            items[0].merge(untouched, updated_at);
        }

        entity.data_mut().set_balance(10i64);
        repo.save(&mut entity).await.unwrap();

        let stored = repo.find(&"acc-1".to_string()).unwrap().unwrap();
        assert_eq!(stored.field("balance"), Some(&json!(10)));
        assert_eq!(stored.field("name"), Some(&json!("stored")));
        assert_eq!(stored.updated_at(), entity.updated_at());
    }

    #[tokio::test]
    async fn generated_id_is_not_written_back_when_create_fails() {
        let repo: InMemoryRepository<Account, (), u64> =
            InMemoryRepository::with_id_generator(sequential(7));
        let _ = panic::catch_unwind(AssertUnwindSafe(|| {
            let _guard = repo.items.write().unwrap();
            panic!("poison the store");
        }));
        let mut entity = Entity::new(EntityOptions::builder().data(account("a")).build());

        let err = repo.save(&mut entity).await.unwrap_err();
        assert!(matches!(err, PersistError::LockPoisoned { operation: "create" }));
        assert_eq!(entity.id(), None);
        assert!(!entity.exists());
    }

    #[tokio::test]
    async fn update_uses_rename_all_keys() {
        let repo: InMemoryRepository<Person> = InMemoryRepository::new();
        let mut entity = Entity::new(
            EntityOptions::builder()
                .id("p-1".to_string())
                .data(Person {
                    full_name: "a".into(),
                })
                .build(),
        );
        repo.save(&mut entity).await.unwrap();
        assert_eq!(Person::FIELDS, &["fullName"]);

        entity.data_mut().set_full_name("b");
        assert_eq!(entity.changes().keys().collect::<Vec<_>>(), vec!["fullName"]);
        repo.save(&mut entity).await.unwrap();

        let stored = repo.find(&"p-1".to_string()).unwrap().unwrap();
        assert_eq!(stored.field("fullName"), Some(&json!("b")));
        assert!(stored.field("full_name").is_none());
        assert!(!entity.is_dirty());
    }

    #[tokio::test]
    async fn update_rejects_changed_field_absent_from_serialized_record() {
        let repo: InMemoryRepository<Memo> = InMemoryRepository::new();
        let mut entity = Entity::new(
            EntityOptions::builder()
                .id("m-1".to_string())
                .data(Memo {
                    note: Some("draft".into()),
                })
                .build(),
        );
        repo.save(&mut entity).await.unwrap();

        {
            let (memo, mut scope) = entity.data_mut();
            scope.assign("note", &mut memo.note, None);
        }
        let err = repo.save(&mut entity).await.unwrap_err();

        assert!(matches!(err, PersistError::InvalidValue { ref reason } if reason.contains("note")));
        assert!(entity.is_dirty());
        let stored = repo.find(&"m-1".to_string()).unwrap().unwrap();
        assert_eq!(stored.field("note"), Some(&json!("draft")));
    }

    #[tokio::test]
    async fn update_of_missing_record_is_not_found_and_stays_dirty() {
        let repo: InMemoryRepository<Account> = InMemoryRepository::new();
        let mut entity = Entity::new(
            EntityOptions::builder()
                .id("ghost".to_string())
                .data(account("a"))
                .exists(true)
                .build(),
        );
        entity.data_mut().set_name("b");

        let err = repo.save(&mut entity).await.unwrap_err();
        assert!(matches!(err, PersistError::NotFound { ref id } if id == "ghost"));
        assert!(entity.is_dirty());
    }

    #[tokio::test]
    async fn delete_reports_whether_found() {
        let repo: InMemoryRepository<Account> = InMemoryRepository::new();
        let mut entity = Entity::new(
            EntityOptions::builder()
                .id("acc-1".to_string())
                .data(account("a"))
                .build(),
        );
        repo.save(&mut entity).await.unwrap();

        assert!(!repo.delete(&"missing".to_string()).await.unwrap());
        assert!(repo.delete(&"acc-1".to_string()).await.unwrap());
        assert!(repo.find(&"acc-1".to_string()).unwrap().is_none());
        assert_eq!(repo.len().unwrap(), 0);
    }

    #[tokio::test]
    async fn load_rehydrates_clean_persisted_entity() {
        let repo: InMemoryRepository<Account> = InMemoryRepository::new();
        let mut entity = Entity::new(
            EntityOptions::builder()
                .id("acc-1".to_string())
                .data(account("a"))
                .build(),
        );
        repo.save(&mut entity).await.unwrap();

        let loaded = repo.load(&"acc-1".to_string()).unwrap().unwrap();
        assert!(loaded.exists());
        assert!(!loaded.is_dirty());
        assert_eq!(loaded.data(), entity.data());
        assert!(repo.load(&"nope".to_string()).unwrap().is_none());

        repo.clear().unwrap();
        assert!(repo.is_empty().unwrap());
    }
}
