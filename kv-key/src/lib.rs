mod arity;
pub mod catalog;
mod composite;
mod error;
mod resolve;
mod selector;
mod types;
mod view;

pub use arity::{MAX_ARITY, check_arity};
pub use composite::{CompositeKey, KeySpec, SelectorTuple};
pub use error::KeyError;
pub use resolve::resolve_common_record;
pub use selector::{Classified, KeySelector, SelectorKind, Slot};
pub use types::TypeDesc;
pub use view::{Convertibility, RecordViews, View, ViewRegistration};

pub use catalog::SelectorMeta;
pub use kv_key_derive::{KeyRecord, key};

#[doc(hidden)]
pub use inventory;

/// KeyExtractor trait 是下游索引结构取键的接口
pub trait KeyExtractor<R> {
    type Key;

    /// 从记录中取出键
    fn key_of(&self, record: &mut R) -> Self::Key;
}

impl<R: 'static, K: 'static> KeyExtractor<R> for KeySelector<R, K> {
    type Key = K;

    fn key_of(&self, record: &mut R) -> K {
        self.extract(record)
    }
}
