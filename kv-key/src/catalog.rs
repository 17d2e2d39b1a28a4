use std::collections::HashMap;

use crate::{Classified, KeyError, SelectorKind, TypeDesc};

// 定义选择器元信息，由 #[derive(KeyRecord)] 提交
pub struct SelectorMeta {
    pub record: fn() -> TypeDesc,
    pub record_path: &'static str,
    pub name: &'static str,
    pub kind: SelectorKind,
    pub key: fn() -> TypeDesc,
}

impl SelectorMeta {
    pub fn classify(&self) -> Classified {
        Classified {
            name: self.name,
            record: (self.record)(),
            key: (self.key)(),
            kind: self.kind,
        }
    }
}

impl std::fmt::Debug for SelectorMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SelectorMeta {{ record: {}, name: {}, kind: {:?}, key: {} }}",
            self.record_path,
            self.name,
            self.kind,
            (self.key)()
        )
    }
}

// 使用 inventory 收集所有选择器
inventory::collect!(SelectorMeta);

// 获取所有已注册的选择器，按记录类型路径分组
pub fn all_selectors() -> HashMap<&'static str, Vec<&'static str>> {
    let mut selectors: HashMap<&'static str, Vec<&'static str>> = HashMap::new();
    for meta in inventory::iter::<SelectorMeta>() {
        selectors.entry(meta.record_path).or_default().push(meta.name);
    }
    selectors
}

/// 按名称查找记录 `R` 上注册过的选择器
pub fn describe<R: 'static>(name: &str) -> Result<Classified, KeyError> {
    let record = TypeDesc::of::<R>();
    inventory::iter::<SelectorMeta>()
        .find(|meta| meta.name == name && (meta.record)() == record)
        .map(SelectorMeta::classify)
        .ok_or_else(|| KeyError::UnrecognizedSelectorShape {
            record,
            selector: name.to_string(),
        })
}
