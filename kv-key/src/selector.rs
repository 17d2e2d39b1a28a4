use std::{fmt, sync::Arc};

use crate::{KeyError, TypeDesc, view::RecordViews};

type ReadFn<R, K> = Arc<dyn Fn(&R) -> K + Send + Sync>;
type WriteFn<R, K> = Arc<dyn Fn(&mut R) -> K + Send + Sync>;

/// 绑定到公共记录类型后的单个槽位
pub enum Slot<C, K> {
    /// 只读槽位，共享借用即可取键
    Read(Box<dyn Fn(&C) -> K + Send + Sync>),
    /// 可变槽位，取键需要独占借用
    Write(Box<dyn Fn(&mut C) -> K + Send + Sync>),
}

impl<C, K> Slot<C, K> {
    pub fn extract(&self, record: &mut C) -> K {
        match self {
            Slot::Read(read) => read(&*record),
            Slot::Write(write) => write(record),
        }
    }

    /// 可变槽位返回 `None`
    pub fn extract_ref(&self, record: &C) -> Option<K> {
        match self {
            Slot::Read(read) => Some(read(record)),
            Slot::Write(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SelectorKind {
    /// 直接读取字段
    Field,
    /// 只读的无参方法
    Accessor,
    /// 需要可变借用的无参方法
    AccessorMut,
    /// 以记录为唯一参数的自由函数
    Function,
}

impl SelectorKind {
    pub fn is_mutating(self) -> bool {
        matches!(self, SelectorKind::AccessorMut)
    }
}

/// 分类结果：`(RecordType, KeyType, ExtractorKind)`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classified {
    pub name: &'static str,
    pub record: TypeDesc,
    pub key: TypeDesc,
    pub kind: SelectorKind,
}

enum Access<R, K> {
    Field(ReadFn<R, K>),
    Accessor(ReadFn<R, K>),
    AccessorMut(WriteFn<R, K>),
    Function(ReadFn<R, K>),
}

impl<R, K> Clone for Access<R, K> {
    fn clone(&self) -> Self {
        match self {
            Access::Field(read) => Access::Field(read.clone()),
            Access::Accessor(read) => Access::Accessor(read.clone()),
            Access::AccessorMut(write) => Access::AccessorMut(write.clone()),
            Access::Function(read) => Access::Function(read.clone()),
        }
    }
}

/// 从记录 `R` 中取出键 `K` 的描述符
///
/// 描述符的形态在声明时就已固定，`R` 与 `K` 即其 `RecordType` 与 `KeyType`。
pub struct KeySelector<R, K> {
    name: &'static str,
    access: Access<R, K>,
}

impl<R, K> Clone for KeySelector<R, K> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            access: self.access.clone(),
        }
    }
}

impl<R: 'static, K: 'static> KeySelector<R, K> {
    pub fn field<F>(name: &'static str, project: F) -> Self
    where
        F: Fn(&R) -> &K + Send + Sync + 'static,
        K: Clone,
    {
        Self {
            name,
            access: Access::Field(Arc::new(move |record: &R| project(record).clone())),
        }
    }

    pub fn accessor<F>(name: &'static str, method: F) -> Self
    where
        F: Fn(&R) -> K + Send + Sync + 'static,
    {
        Self {
            name,
            access: Access::Accessor(Arc::new(method)),
        }
    }

    pub fn accessor_mut<F>(name: &'static str, method: F) -> Self
    where
        F: Fn(&mut R) -> K + Send + Sync + 'static,
    {
        Self {
            name,
            access: Access::AccessorMut(Arc::new(method)),
        }
    }

    pub fn function<F>(name: &'static str, function: F) -> Self
    where
        F: Fn(&R) -> K + Send + Sync + 'static,
    {
        Self {
            name,
            access: Access::Function(Arc::new(function)),
        }
    }

    /// 按值接收记录的自由函数，每次提取都会克隆一份记录
    pub fn function_owned<F>(name: &'static str, function: F) -> Self
    where
        F: Fn(R) -> K + Send + Sync + 'static,
        R: Clone,
    {
        Self {
            name,
            access: Access::Function(Arc::new(move |record: &R| function(record.clone()))),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn record_type(&self) -> TypeDesc {
        TypeDesc::of::<R>()
    }

    pub fn key_type(&self) -> TypeDesc {
        TypeDesc::of::<K>()
    }

    pub fn kind(&self) -> SelectorKind {
        match &self.access {
            Access::Field(_) => SelectorKind::Field,
            Access::Accessor(_) => SelectorKind::Accessor,
            Access::AccessorMut(_) => SelectorKind::AccessorMut,
            Access::Function(_) => SelectorKind::Function,
        }
    }

    pub fn classify(&self) -> Classified {
        Classified {
            name: self.name,
            record: self.record_type(),
            key: self.key_type(),
            kind: self.kind(),
        }
    }

    pub fn extract(&self, record: &mut R) -> K {
        match &self.access {
            Access::Field(read) | Access::Accessor(read) | Access::Function(read) => read(&*record),
            Access::AccessorMut(write) => write(record),
        }
    }

    /// 通过 `C -> R` 的视图把描述符绑定到公共记录类型 `C`
    pub(crate) fn bind<C: 'static>(self, views: &RecordViews) -> Result<Slot<C, K>, KeyError> {
        let view = views
            .view::<C, R>()
            .ok_or(KeyError::IncompatibleRecordTypes {
                left: TypeDesc::of::<C>(),
                right: TypeDesc::of::<R>(),
            })?;
        let slot = match self.access {
            Access::Field(read) | Access::Accessor(read) | Access::Function(read) => {
                Slot::Read(Box::new(move |record: &C| read(view.get(record))))
            }
            Access::AccessorMut(write) => {
                Slot::Write(Box::new(move |record: &mut C| write(view.get_mut(record))))
            }
        };
        Ok(slot)
    }
}

impl<R: 'static, K: 'static> fmt::Debug for KeySelector<R, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySelector")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("record", &self.record_type())
            .field("key", &self.key_type())
            .finish()
    }
}
