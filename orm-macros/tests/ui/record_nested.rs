use orm_core::Entity;
use orm_core::object::{Object, ToObjectOptions};

#[orm_macros::record(debug = false)]
struct Stats {
    age: u32,
}

impl std::fmt::Debug for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Stats(..)")
    }
}

#[orm_macros::record]
struct Profile {
    nickname: String,
    #[track(nested)]
    stats: Stats,
}

fn hide_secret(mut object: Object, options: &ToObjectOptions) -> Object {
    if options.view() == Some("public") {
        object.remove("secret");
    }
    object
}

#[orm_macros::record(filter = hide_secret)]
struct User {
    secret: String,
    #[track(nested)]
    profile: Profile,
}

fn main() {
    let mut entity: Entity<User> = Entity::from(User {
        secret: "s".into(),
        profile: Profile {
            nickname: "n".into(),
            stats: Stats { age: 1 },
        },
    });

    let id = entity.data_mut().profile().stats().scope_id();
    assert!(entity.data_mut().profile().stats().set_age(2u32));
    assert_eq!(entity.data_mut().profile().stats().scope_id(), id);
    assert_eq!(entity.changes().keys().collect::<Vec<_>>(), vec!["profile"]);

    let public = entity
        .to_object(&ToObjectOptions::view_named("public"))
        .unwrap();
    assert!(public.get("secret").is_none());
    assert!(entity.to_json().unwrap().get("secret").is_some());
}
