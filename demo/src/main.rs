use anyhow::Result as AnyResult;
use chrono::{DateTime, Utc};
use orm_core::object::{Object, ToObjectOptions};
use orm_core::persist::{InMemoryRepository, Repository, RepositoryExt};
use orm_core::{Entity, EntityGroup, EntityOptions};
use orm_macros::{entity_id, record, relations};
use tracing_subscriber::EnvFilter;

#[entity_id]
struct AuthorId(String);

#[record]
struct Social {
    website: Option<String>,
    followers: u64,
}

fn author_view(mut object: Object, options: &ToObjectOptions) -> Object {
    if options.view() == Some("public") {
        object.remove("email");
    }
    object
}

#[record(filter = author_view)]
struct Author {
    name: String,
    email: String,
    #[track(nested)]
    social: Social,
}

#[record]
struct Post {
    title: String,
    published_at: Option<DateTime<Utc>>,
}

#[relations(default = true)]
struct AuthorRelations {
    posts: EntityGroup<Entity<Post>>,
}

type AuthorEntity = Entity<Author, AuthorRelations, AuthorId>;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> AnyResult<()> {
    init_tracing();

    let repo: InMemoryRepository<Author, AuthorRelations, AuthorId> = InMemoryRepository::new();

    let posts: EntityGroup<Entity<Post>> = vec![
        Entity::new(
            EntityOptions::builder()
                .id("p-1".to_string())
                .data(Post {
                    title: "Hello".into(),
                    published_at: Some(Utc::now()),
                })
                .build(),
        ),
        Entity::new(
            EntityOptions::builder()
                .id("p-2".to_string())
                .data(Post {
                    title: "Draft".into(),
                    published_at: None,
                })
                .build(),
        ),
    ]
    .into();

    let mut author: AuthorEntity = Entity::new(
        EntityOptions::builder()
            .id(AuthorId::new("a-1"))
            .data(Author {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                social: Social {
                    website: None,
                    followers: 10,
                },
            })
            .relations(AuthorRelations { posts })
            .build(),
    );

    // 首次保存：create
    repo.save(&mut author).await?;
    tracing::info!(exists = author.exists(), "author created");

    // 干净实体：不触达后端
    repo.save(&mut author).await?;

    // 嵌套写入归属到顶层字段 social
    author.data_mut().social().set_followers(11u64);
    author
        .data_mut()
        .social()
        .set_website(Some("https://ada.dev".to_string()));
    tracing::info!(changes = %author.changes().to_value(), "pending changes");
    repo.save(&mut author).await?;

    let public = author.to_object(&ToObjectOptions::view_named("public"))?;
    println!("{}", serde_json::to_string_pretty(&public)?);

    let draft = author.relations().posts.find_by_id("p-2");
    tracing::info!(found = draft.is_some(), "draft lookup");

    if let Some(stored) = repo.find(&AuthorId::new("a-1"))? {
        println!("stored: {}", serde_json::to_string(stored.data())?);
    }

    let removed = repo.delete(&AuthorId::new("a-1")).await?;
    tracing::info!(removed, remaining = repo.len()?, "author deleted");
    Ok(())
}
