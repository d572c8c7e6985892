use orm_core::object::{Relations, ToObjectOptions, Value};
use orm_core::{Entity, EntityGroup, EntityOptions};

#[orm_macros::record]
struct Post {
    title: String,
}

#[orm_macros::record]
struct Author {
    name: String,
}

#[orm_macros::relations(default = true)]
struct AuthorRelations {
    posts: EntityGroup<Entity<Post>>,
    mentor: Option<Entity<Author>>,
}

fn main() {
    let empty = AuthorRelations::default();
    let object = empty.to_object(&ToObjectOptions::default()).unwrap();
    assert_eq!(object.get("mentor"), Some(&Value::Null));
    assert_eq!(object.get("posts"), Some(&Value::Array(vec![])));

    let post = Entity::from(Post { title: "t".into() });
    let author: Entity<Author, AuthorRelations> = Entity::new(
        EntityOptions::builder()
            .id("a-1".to_string())
            .data(Author { name: "x".into() })
            .relations(AuthorRelations {
                posts: vec![post].into(),
                mentor: None,
            })
            .build(),
    );

    let json = author.to_json().unwrap();
    assert_eq!(json["relations"]["posts"][0]["title"], Value::from("t"));
    let _ = format!("{:?}", author.relations());
}
