use chrono::{DateTime, Utc};
use orm_core::{Entity, Record};

#[orm_macros::record]
struct Article {
    title: String,
    r#type: String,
    #[serde(rename = "publishedAt")]
    published_at: Option<DateTime<Utc>>,
    tags: Vec<String>,
}

fn main() {
    assert_eq!(Article::FIELDS, &["title", "type", "publishedAt", "tags"]);

    let mut entity: Entity<Article> = Entity::from(Article {
        title: "a".into(),
        r#type: "post".into(),
        published_at: None,
        tags: vec![],
    });

    let mut data = entity.data_mut();
    assert!(data.set_title("b"));
    assert!(!data.set_type("post"));
    assert!(data.update_tags(|tags| tags.push("rust".into())));
    assert!(data.set_published_at(Some(Utc::now())));
    assert_eq!(data.title, "b"); // 视图可直接读取字段

    assert!(entity.is_dirty());
    assert!(entity.changes().contains("title"));
    assert!(entity.changes().contains("publishedAt"));
    assert!(!entity.changes().contains("type"));
}
