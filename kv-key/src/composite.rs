use std::fmt;

use crate::{
    Classified, Convertibility, KeyError, KeyExtractor, KeySelector, RecordViews, Slot, TypeDesc,
    check_arity, resolve_common_record,
};

/// 由若干 `KeySelector` 组成的元组
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a composite key specification",
    note = "a composite key is a tuple of 1 to 10 `KeySelector`s"
)]
pub trait SelectorTuple: Sized {
    type Keys;
    type Slots<C: 'static>: Send + Sync;

    const LEN: usize;

    fn classify(&self) -> Vec<Classified>;

    fn bind<C: 'static>(self, views: &RecordViews) -> Result<Self::Slots<C>, KeyError>;

    fn extract<C: 'static>(slots: &Self::Slots<C>, record: &mut C) -> Self::Keys;

    fn extract_ref<C: 'static>(slots: &Self::Slots<C>, record: &C) -> Option<Self::Keys>;
}

impl SelectorTuple for () {
    type Keys = ();
    type Slots<C: 'static> = ();

    const LEN: usize = 0;

    fn classify(&self) -> Vec<Classified> {
        Vec::new()
    }

    fn bind<C: 'static>(self, _views: &RecordViews) -> Result<Self::Slots<C>, KeyError> {
        Ok(())
    }

    fn extract<C: 'static>(_slots: &Self::Slots<C>, _record: &mut C) -> Self::Keys {}

    fn extract_ref<C: 'static>(_slots: &Self::Slots<C>, _record: &C) -> Option<Self::Keys> {
        Some(())
    }
}

macro_rules! impl_selector_tuple {
    ($len:expr; $(($idx:tt, $R:ident, $K:ident)),+) => {
        impl<$($R: 'static, $K: 'static),+> SelectorTuple for ($(KeySelector<$R, $K>,)+) {
            type Keys = ($($K,)+);
            type Slots<C: 'static> = ($(Slot<C, $K>,)+);

            const LEN: usize = $len;

            fn classify(&self) -> Vec<Classified> {
                vec![$(self.$idx.classify()),+]
            }

            fn bind<C: 'static>(self, views: &RecordViews) -> Result<Self::Slots<C>, KeyError> {
                Ok(($(self.$idx.bind::<C>(views)?,)+))
            }

            fn extract<C: 'static>(slots: &Self::Slots<C>, record: &mut C) -> Self::Keys {
                ($(slots.$idx.extract(&mut *record),)+)
            }

            fn extract_ref<C: 'static>(slots: &Self::Slots<C>, record: &C) -> Option<Self::Keys> {
                Some(($(slots.$idx.extract_ref(record)?,)+))
            }
        }
    };
}

impl_selector_tuple!(1; (0, R1, K1));
impl_selector_tuple!(2; (0, R1, K1), (1, R2, K2));
impl_selector_tuple!(3; (0, R1, K1), (1, R2, K2), (2, R3, K3));
impl_selector_tuple!(4; (0, R1, K1), (1, R2, K2), (2, R3, K3), (3, R4, K4));
impl_selector_tuple!(5; (0, R1, K1), (1, R2, K2), (2, R3, K3), (3, R4, K4), (4, R5, K5));
impl_selector_tuple!(6; (0, R1, K1), (1, R2, K2), (2, R3, K3), (3, R4, K4), (4, R5, K5),
    (5, R6, K6));
impl_selector_tuple!(7; (0, R1, K1), (1, R2, K2), (2, R3, K3), (3, R4, K4), (4, R5, K5),
    (5, R6, K6), (6, R7, K7));
impl_selector_tuple!(8; (0, R1, K1), (1, R2, K2), (2, R3, K3), (3, R4, K4), (4, R5, K5),
    (5, R6, K6), (6, R7, K7), (7, R8, K8));
impl_selector_tuple!(9; (0, R1, K1), (1, R2, K2), (2, R3, K3), (3, R4, K4), (4, R5, K5),
    (5, R6, K6), (6, R7, K7), (7, R8, K8), (8, R9, K9));
impl_selector_tuple!(10; (0, R1, K1), (1, R2, K2), (2, R3, K3), (3, R4, K4), (4, R5, K5),
    (5, R6, K6), (6, R7, K7), (7, R8, K8), (8, R9, K9), (9, R10, K10));
// 超过 MAX_ARITY 的元组仍可构造，由 check_arity 在构建时拒绝
impl_selector_tuple!(11; (0, R1, K1), (1, R2, K2), (2, R3, K3), (3, R4, K4), (4, R5, K5),
    (5, R6, K6), (6, R7, K7), (7, R8, K8), (8, R9, K9), (9, R10, K10), (10, R11, K11));
impl_selector_tuple!(12; (0, R1, K1), (1, R2, K2), (2, R3, K3), (3, R4, K4), (4, R5, K5),
    (5, R6, K6), (6, R7, K7), (7, R8, K8), (8, R9, K9), (9, R10, K10), (10, R11, K11),
    (11, R12, K12));

/// 组合键声明，按顺序决定下游的字典序比较
pub struct KeySpec<T> {
    selectors: T,
}

impl<T: SelectorTuple> KeySpec<T> {
    pub fn new(selectors: T) -> Self {
        Self { selectors }
    }

    pub fn arity(&self) -> usize {
        T::LEN
    }

    pub fn classify(&self) -> Result<Vec<Classified>, KeyError> {
        check_arity(T::LEN)?;
        Ok(self.selectors.classify())
    }

    /// 只做类型推导，不绑定提取函数
    pub fn resolve<V>(&self, conv: &V) -> Result<TypeDesc, KeyError>
    where
        V: Convertibility + ?Sized,
    {
        let records: Vec<_> = self.classify()?.iter().map(|slot| slot.record).collect();
        resolve_common_record(&records, conv)
    }

    pub fn build<C: 'static>(self, views: &RecordViews) -> Result<CompositeKey<C, T>, KeyError> {
        self.build_inner(views).inspect_err(|err| {
            log::warn!("failed to build composite key over {}: {err}", TypeDesc::of::<C>())
        })
    }

    fn build_inner<C: 'static>(self, views: &RecordViews) -> Result<CompositeKey<C, T>, KeyError> {
        let selectors = self.classify()?;
        let records: Vec<_> = selectors.iter().map(|slot| slot.record).collect();
        let record_type = resolve_common_record(&records, views)?;

        let requested = TypeDesc::of::<C>();
        if record_type != requested {
            return Err(KeyError::RecordTypeMismatch {
                resolved: record_type,
                requested,
            });
        }

        let slots = self.selectors.bind::<C>(views)?;
        log::debug!(
            "built composite key over {record_type} with {} slots",
            selectors.len()
        );
        Ok(CompositeKey {
            record_type,
            selectors,
            slots,
        })
    }
}

impl<T: SelectorTuple> fmt::Debug for KeySpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySpec")
            .field("selectors", &self.selectors.classify())
            .finish()
    }
}

/// 构建完成的组合键提取器，构建后不再变化
pub struct CompositeKey<C: 'static, T: SelectorTuple> {
    record_type: TypeDesc,
    selectors: Vec<Classified>,
    slots: T::Slots<C>,
}

impl<C: 'static, T: SelectorTuple> CompositeKey<C, T> {
    pub fn record_type(&self) -> TypeDesc {
        self.record_type
    }

    pub fn key_types(&self) -> Vec<TypeDesc> {
        self.selectors.iter().map(|slot| slot.key).collect()
    }

    pub fn selectors(&self) -> &[Classified] {
        &self.selectors
    }

    pub fn arity(&self) -> usize {
        self.selectors.len()
    }

    /// 所有槽位都不需要可变借用记录
    pub fn is_read_only(&self) -> bool {
        !self.selectors.iter().any(|slot| slot.kind.is_mutating())
    }

    pub fn extract(&self, record: &mut C) -> T::Keys {
        T::extract(&self.slots, record)
    }

    /// 通过共享借用取键，含可变槽位时返回 `None`
    pub fn extract_ref(&self, record: &C) -> Option<T::Keys> {
        T::extract_ref(&self.slots, record)
    }
}

impl<C: 'static, T: SelectorTuple> KeyExtractor<C> for CompositeKey<C, T> {
    type Key = T::Keys;

    fn key_of(&self, record: &mut C) -> Self::Key {
        self.extract(record)
    }
}

impl<C: 'static, T: SelectorTuple> fmt::Debug for CompositeKey<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeKey")
            .field("record_type", &self.record_type)
            .field("selectors", &self.selectors)
            .finish()
    }
}
