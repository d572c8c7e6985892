use orm_macros::entity_id;
use std::str::FromStr;
use uuid::Uuid;

#[entity_id]
struct UserId(Uuid);

#[entity_id(debug = false)]
struct ProfileId(String);

impl std::fmt::Debug for ProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProfileId(..)")
    }
}

fn assert_entity_id<T: orm_core::id::EntityId>() {}

fn main() {
    assert_entity_id::<UserId>();
    assert_entity_id::<ProfileId>();

    let raw = Uuid::new_v4();
    let id = UserId::new(raw);
    let _ = format!("{:?}", id); // 默认启用 Debug
    assert_eq!(id.to_string(), raw.to_string());
    assert_eq!(UserId::from_str(&raw.to_string()).unwrap(), id);

    let pid = ProfileId::new("p-1");
    let _ = format!("{:?}", pid); // 使用手写 Debug
    assert_eq!(pid.as_ref(), "p-1");
    assert_eq!(String::from(pid), "p-1");
}
