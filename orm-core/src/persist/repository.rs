use crate::entity::Persistable;
use async_trait::async_trait;
use std::sync::Arc;

/// 存储后端契约
///
/// 后端只负责 `create` / `update` / `delete`；何时调用由 `RepositoryExt::save` 决定。
/// 后端错误原样返回，核心层不做捕获或转换。
#[async_trait]
pub trait Repository<E>: Send + Sync
where
    E: Persistable,
{
    type Error: std::error::Error + Send + Sync + 'static;

    /// 首次持久化；后端分配标识时需在返回前通过 `set_id` 回写
    async fn create(&self, entity: &mut E) -> Result<(), Self::Error>;

    /// 持久化已存在实体的脏字段
    async fn update(&self, entity: &mut E) -> Result<(), Self::Error>;

    /// 按标识删除，返回是否找到；不存在不是错误
    async fn delete(&self, id: &E::Id) -> Result<bool, Self::Error>;
}

#[async_trait]
impl<E, T> Repository<E> for Arc<T>
where
    E: Persistable,
    T: Repository<E> + ?Sized,
{
    type Error = T::Error;

    async fn create(&self, entity: &mut E) -> Result<(), Self::Error> {
        (**self).create(entity).await
    }

    async fn update(&self, entity: &mut E) -> Result<(), Self::Error> {
        (**self).update(entity).await
    }

    async fn delete(&self, id: &E::Id) -> Result<bool, Self::Error> {
        (**self).delete(id).await
    }
}

#[async_trait]
pub trait RepositoryExt<E>: Repository<E>
where
    E: Persistable,
{
    /// 按实体状态分派：
    /// - 未持久化：`create`，成功后置 `exists` 并提交；
    /// - 已持久化且干净：不调用后端；
    /// - 已持久化且有脏字段：`update`，成功后提交。
    ///
    /// 后端失败时实体保持原状（仍为脏、`exists` 不变），再次调用即重试。
    async fn save(&self, entity: &mut E) -> Result<(), Self::Error> {
        if !entity.exists() {
            tracing::debug!(id = ?entity.id(), "save: create");
            self.create(entity).await?;
            entity.set_exists(true);
            entity.commit();
            return Ok(());
        }

        if !entity.is_dirty() {
            tracing::debug!(id = ?entity.id(), "save: clean, skipped");
            return Ok(());
        }

        tracing::debug!(id = ?entity.id(), "save: update");
        self.update(entity).await?;
        entity.commit();
        Ok(())
    }
}

#[async_trait]
impl<E, T> RepositoryExt<E> for T
where
    E: Persistable,
    T: Repository<E> + ?Sized,
{
}
