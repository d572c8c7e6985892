use proc_macro::TokenStream;

mod entity_id;
mod record;
mod relations;
mod utils;

/// 记录宏
/// - 为具名字段结构体合并派生 `Clone/PartialEq/Serialize/Deserialize`（`Debug` 可关闭）
/// - 追踪键与序列化键一致：字段 `#[serde(rename)]` 优先，其次容器 `#[serde(rename_all)]`；
///   `flatten` / `skip*` 字段会被拒绝
/// - 生成可写视图 `XxxMut<'a>`：`set_xxx(value) -> bool`、`update_xxx(|v| ..) -> bool`
/// - 字段标注 `#[track(nested)]` 时生成同名访问器，返回嵌套记录的可写视图，
///   深层写入归属到该顶层字段
/// - 实现 `::orm_core::record::Record`
/// - 参数：`#[record(debug = false, filter = path::to::fn)]`，
///   `filter` 签名为 `fn(Object, &ToObjectOptions) -> Object`
#[proc_macro_attribute]
pub fn record(attr: TokenStream, item: TokenStream) -> TokenStream {
    record::expand(attr, item)
}

/// 关联宏
/// - 为具名字段结构体合并派生 `Debug`（可关闭）
/// - `#[relations(default = true)]` 时追加派生 `Default`，配合 `Entity::new` 省略关联；
///   含必填关联（如 `Entity<Post>`）时不派生，改用 `Entity::try_new`
/// - 实现 `::orm_core::object::Relations`，各字段需实现 `ToObject`
#[proc_macro_attribute]
pub fn relations(attr: TokenStream, item: TokenStream) -> TokenStream {
    relations::expand(attr, item)
}

/// 实体 ID 宏
/// 用于 `tuple struct` 形式的 ID 类型（例如 `struct AccountId(String);`、`struct OrderId(Uuid);`），
/// 生成的类型可直接作为 `Entity` 的标识类型。
#[proc_macro_attribute]
pub fn entity_id(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity_id::expand(attr, item)
}
