/// InMemoryRepository 示例
/// 演示实体从创建、增量更新到删除的完整生命周期：
/// 干净实体的 save 不会触达后端，脏实体只合并变更过的字段
use anyhow::Result as AnyResult;
use orm_core::id::id_generator;
use orm_core::persist::{InMemoryRepository, Repository, RepositoryExt};
use orm_core::{Entity, EntityOptions};
use orm_macros::record;
use ulid::Ulid;

#[record]
struct Product {
    sku: String,
    price_cents: i64,
    tags: Vec<String>,
}

#[tokio::main]
async fn main() -> AnyResult<()> {
    let repo: InMemoryRepository<Product> =
        InMemoryRepository::with_id_generator(id_generator(|| Ulid::new().to_string()));

    let mut product = Entity::new(
        EntityOptions::builder()
            .data(Product {
                sku: "SKU-1".into(),
                price_cents: 1999,
                tags: vec![],
            })
            .build(),
    );

    repo.save(&mut product).await?;
    let id = product.id().cloned().unwrap_or_default();
    println!("created {id} exists={}", product.exists());

    // 等值写入不会产生脏字段
    product.data_mut().set_price_cents(1999i64);
    println!("after equal write dirty={}", product.is_dirty());
    repo.save(&mut product).await?;

    product.data_mut().set_price_cents(1499i64);
    product
        .data_mut()
        .update_tags(|tags| tags.push("sale".into()));
    println!("changes before save: {}", product.changes().to_value());
    repo.save(&mut product).await?;

    if let Some(stored) = repo.find(&id)? {
        println!("stored data: {}", serde_json::to_string(stored.data())?);
    }

    let reloaded = repo.load(&id)?;
    println!(
        "reloaded clean={}",
        reloaded.map(|p| !p.is_dirty()).unwrap_or(false)
    );

    println!("deleted={}", repo.delete(&id).await?);
    println!("deleted again={}", repo.delete(&id).await?);
    Ok(())
}
