/// 嵌套记录的变更追踪示例
/// 深层写入归属到顶层字段，changes 中保存的是该字段首次修改前的完整快照
use orm_core::Entity;
use orm_macros::record;

#[record]
struct Geo {
    lat: f64,
    lng: f64,
}

#[record]
struct Address {
    city: String,
    #[track(nested)]
    geo: Geo,
}

#[record]
struct Customer {
    name: String,
    #[track(nested)]
    address: Address,
}

fn main() {
    let mut customer: Entity<Customer> = Entity::from(Customer {
        name: "Ada".into(),
        address: Address {
            city: "London".into(),
            geo: Geo {
                lat: 51.5,
                lng: -0.12,
            },
        },
    });

    let view = customer.data_mut().address().geo().scope_id();
    customer.data_mut().address().geo().set_lat(48.85);
    customer.data_mut().address().set_city("Paris");

    println!("dirty fields: {:?}", customer.changes().keys().collect::<Vec<_>>());
    println!("address before: {}", customer.changes().to_value()["address"]);
    println!(
        "geo view stable: {}",
        customer.data_mut().address().geo().scope_id() == view
    );

    customer.commit();
    println!("after commit dirty={}", customer.is_dirty());
}
