mod descriptor;
mod record;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

use crate::descriptor::KeyList;

/// 声明组合键，在编译期完成描述符形态识别与槽位数检查
///
/// 支持的形态：
///
/// ```ignore
/// let spec = kv_key::key!(
///     Person.age,                 // 字段
///     Person::full_name(),        // 只读方法
///     &mut Person::next_ticket(), // 可变方法
///     extract_zip(&Person),       // 自由函数，按引用
///     zip_code(Person),           // 自由函数，按值
/// );
/// ```
///
/// 形态只看书写方式，不看方法签名：接收 `&mut self` 的方法必须写成
/// `&mut Record::method()`，省略 `&mut` 会被当作只读方法，
/// 随后在 `KeySelector::accessor` 的 `Fn(&R) -> K` 约束上报错。
#[proc_macro]
pub fn key(input: TokenStream) -> TokenStream {
    let list = parse_macro_input!(input as KeyList);

    match descriptor::expand(list) {
        Ok(codegen) => codegen.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

/// 为记录类型生成字段描述符并注册到全局目录
///
/// ```ignore
/// #[derive(KeyRecord)]
/// pub struct Employee {
///     #[view]
///     pub person: Person,
///     #[index]
///     pub salary: u64,
/// }
///
/// let salary = Employee::salary_key();
/// ```
#[proc_macro_derive(KeyRecord, attributes(index, view))]
pub fn derive_key_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match record::expand(input) {
        Ok(codegen) => codegen.into(),
        Err(e) => e.to_compile_error().into(),
    }
}
