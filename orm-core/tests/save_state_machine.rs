use anyhow::Result as AnyResult;
use async_trait::async_trait;
use orm_core::error::PersistError;
use orm_core::id::sequential;
use orm_core::persist::{Repository, RepositoryExt};
use orm_core::{Entity, EntityOptions, Persistable};
use orm_macros::record;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

#[record]
struct Counter {
    label: String,
    x: i64,
}

type CounterEntity = Entity<Counter, (), u64>;

fn counter() -> CounterEntity {
    Entity::new(
        EntityOptions::builder()
            .data(Counter {
                label: "c".into(),
                x: 0,
            })
            .build(),
    )
}

// 记录调用次数以及 update 被调用时看到的脏字段
#[derive(Default, Clone)]
struct CountingRepo {
    creates: Arc<Mutex<usize>>,
    updates: Arc<Mutex<Vec<Value>>>,
    deleted: Arc<Mutex<Vec<u64>>>,
    next_id: Arc<Mutex<u64>>,
}

impl CountingRepo {
    fn creates(&self) -> usize {
        *self.creates.lock().unwrap()
    }

    fn updates(&self) -> Vec<Value> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl Repository<CounterEntity> for CountingRepo {
    type Error = PersistError;

    async fn create(&self, entity: &mut CounterEntity) -> Result<(), PersistError> {
        *self.creates.lock().unwrap() += 1;
        if entity.id().is_none() {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            entity.set_id(*next);
        }
        Ok(())
    }

    async fn update(&self, entity: &mut CounterEntity) -> Result<(), PersistError> {
        self.updates.lock().unwrap().push(entity.changes().to_value());
        Ok(())
    }

    async fn delete(&self, id: &u64) -> Result<bool, PersistError> {
        let mut deleted = self.deleted.lock().unwrap();
        if deleted.contains(id) {
            return Ok(false);
        }
        deleted.push(*id);
        Ok(true)
    }
}

// 所有调用都失败的后端
struct FailingRepo;

#[async_trait]
impl Repository<CounterEntity> for FailingRepo {
    type Error = PersistError;

    async fn create(&self, _entity: &mut CounterEntity) -> Result<(), PersistError> {
        Err(PersistError::Repository {
            reason: "create refused".into(),
        })
    }

    async fn update(&self, _entity: &mut CounterEntity) -> Result<(), PersistError> {
        Err(PersistError::Repository {
            reason: "update refused".into(),
        })
    }

    async fn delete(&self, _id: &u64) -> Result<bool, PersistError> {
        Err(PersistError::Repository {
            reason: "delete refused".into(),
        })
    }
}

#[tokio::test]
async fn transient_entity_is_created_once() -> AnyResult<()> {
    let repo = CountingRepo::default();
    let mut entity = counter();

    repo.save(&mut entity).await?;

    assert_eq!(repo.creates(), 1);
    assert!(repo.updates().is_empty());
    assert!(entity.exists());
    assert_eq!(entity.id(), Some(&1));
    Ok(())
}

#[tokio::test]
async fn create_commits_changes_made_before_first_save() -> AnyResult<()> {
    let repo = CountingRepo::default();
    let mut entity = counter();
    entity.data_mut().set_x(5i64);
    assert!(entity.is_dirty());

    repo.save(&mut entity).await?;

    assert!(!entity.is_dirty());
    assert_eq!(repo.creates(), 1);
    Ok(())
}

#[tokio::test]
async fn persisted_clean_entity_skips_backend() -> AnyResult<()> {
    let repo = CountingRepo::default();
    let mut entity = counter();
    repo.save(&mut entity).await?;

    repo.save(&mut entity).await?;
    repo.save(&mut entity).await?;

    assert_eq!(repo.creates(), 1);
    assert!(repo.updates().is_empty());
    Ok(())
}

#[tokio::test]
async fn dirty_entity_is_updated_with_previous_values() -> AnyResult<()> {
    let repo = CountingRepo::default();
    let mut entity = counter();
    repo.save(&mut entity).await?;

    entity.data_mut().set_x(1i64);
    repo.save(&mut entity).await?;

    assert_eq!(repo.updates(), vec![json!({ "x": 0 })]);
    assert!(!entity.is_dirty());
    assert_eq!(repo.creates(), 1);
    Ok(())
}

#[tokio::test]
async fn failed_create_leaves_entity_transient_and_retry_succeeds() -> AnyResult<()> {
    let mut entity = counter();
    entity.data_mut().set_label("d");

    let err = FailingRepo.save(&mut entity).await.unwrap_err();
    assert!(matches!(err, PersistError::Repository { .. }));
    assert!(!entity.exists());
    assert!(entity.is_dirty());

    let repo = CountingRepo::default();
    repo.save(&mut entity).await?;
    assert!(entity.exists());
    assert!(!entity.is_dirty());
    Ok(())
}

#[tokio::test]
async fn failed_update_keeps_dirty_fields() -> AnyResult<()> {
    let mut entity: CounterEntity = Entity::new(
        EntityOptions::builder()
            .id(7)
            .data(Counter {
                label: "c".into(),
                x: 0,
            })
            .exists(true)
            .build(),
    );
    entity.data_mut().set_x(3i64);

    assert!(FailingRepo.save(&mut entity).await.is_err());
    assert!(entity.exists());
    assert_eq!(entity.changes().to_value(), json!({ "x": 0 }));
    Ok(())
}

#[tokio::test]
async fn delete_reports_found_and_propagates_failures() -> AnyResult<()> {
    let repo = CountingRepo::default();
    assert!(repo.delete(&1).await?);
    assert!(!repo.delete(&1).await?);
    assert!(FailingRepo.delete(&1).await.is_err());
    Ok(())
}

#[tokio::test]
async fn repositories_are_usable_through_arc() -> AnyResult<()> {
    let repo = Arc::new(CountingRepo::default());
    let mut entity: CounterEntity = Entity::new(
        EntityOptions::builder()
            .id_generator(sequential(40))
            .data(Counter {
                label: "c".into(),
                x: 0,
            })
            .build(),
    );

    repo.save(&mut entity).await?;
    assert_eq!(entity.id(), Some(&40));
    assert_eq!(repo.creates(), 1);
    Ok(())
}

#[tokio::test]
async fn save_is_available_to_generic_callers() -> AnyResult<()> {
    async fn save_all<R>(repo: &R, entities: &mut [CounterEntity]) -> Result<(), R::Error>
    where
        R: Repository<CounterEntity>,
    {
        for entity in entities.iter_mut() {
            repo.save(entity).await?;
        }
        Ok(())
    }

    let repo = CountingRepo::default();
    let mut batch = vec![counter(), counter()];
    save_all(&repo, &mut batch).await?;

    assert_eq!(repo.creates(), 2);
    assert!(batch.iter().all(Persistable::exists));
    Ok(())
}
