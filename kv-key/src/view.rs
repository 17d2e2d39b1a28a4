use std::{
    any::Any,
    collections::{HashMap, VecDeque},
    fmt,
    sync::Arc,
};

use crate::TypeDesc;

/// 记录类型之间的可转换关系
///
/// `is_convertible(from, to)` 为真表示声明在 `from` 上的描述符可以读取一条 `to` 记录。
pub trait Convertibility {
    fn is_convertible(&self, from: TypeDesc, to: TypeDesc) -> bool;
}

impl<F> Convertibility for F
where
    F: Fn(TypeDesc, TypeDesc) -> bool,
{
    fn is_convertible(&self, from: TypeDesc, to: TypeDesc) -> bool {
        self(from, to)
    }
}

type Get<O, I> = Arc<dyn Fn(&O) -> &I + Send + Sync>;
type GetMut<O, I> = Arc<dyn Fn(&mut O) -> &mut I + Send + Sync>;

/// 从外层记录 `O` 投影到内嵌记录 `I`
pub struct View<O, I> {
    get: Get<O, I>,
    get_mut: GetMut<O, I>,
}

impl<O, I> Clone for View<O, I> {
    fn clone(&self) -> Self {
        Self {
            get: self.get.clone(),
            get_mut: self.get_mut.clone(),
        }
    }
}

impl<O: 'static, I: 'static> View<O, I> {
    pub fn new<G, M>(get: G, get_mut: M) -> Self
    where
        G: Fn(&O) -> &I + Send + Sync + 'static,
        M: Fn(&mut O) -> &mut I + Send + Sync + 'static,
    {
        Self {
            get: Arc::new(get),
            get_mut: Arc::new(get_mut),
        }
    }

    pub fn via_as_ref() -> Self
    where
        O: AsRef<I> + AsMut<I>,
    {
        Self::new(<O as AsRef<I>>::as_ref, <O as AsMut<I>>::as_mut)
    }

    pub fn get<'a>(&self, outer: &'a O) -> &'a I {
        (self.get)(outer)
    }

    pub fn get_mut<'a>(&self, outer: &'a mut O) -> &'a mut I {
        (self.get_mut)(outer)
    }

    // 沿已登记的视图逐层投影，路径两端的类型在查找时已核对
    fn through(hops: Vec<Arc<dyn Projection>>) -> Self {
        let hops: Arc<[Arc<dyn Projection>]> = hops.into();
        let hops_mut = hops.clone();
        Self::new(
            move |outer: &O| {
                let erased: &(dyn Any + 'static) = outer;
                let inner = hops.iter().fold(erased, |current, hop| {
                    match hop.project(current) {
                        Some(next) => next,
                        None => unreachable!("record view path is broken"),
                    }
                });
                match inner.downcast_ref::<I>() {
                    Some(inner) => inner,
                    None => unreachable!("record view path ends at the wrong type"),
                }
            },
            move |outer: &mut O| {
                let erased: &mut (dyn Any + 'static) = outer;
                let inner = hops_mut.iter().fold(erased, |current, hop| {
                    match hop.project_mut(current) {
                        Some(next) => next,
                        None => unreachable!("record view path is broken"),
                    }
                });
                match inner.downcast_mut::<I>() {
                    Some(inner) => inner,
                    None => unreachable!("record view path ends at the wrong type"),
                }
            },
        )
    }
}

impl<O: 'static> View<O, O> {
    pub fn identity() -> Self {
        Self::new(|outer| outer, |outer| outer)
    }
}

// 擦除类型后的单层视图，用于拼接多层投影
trait Projection: Send + Sync {
    fn project<'a>(&self, outer: &'a (dyn Any + 'static)) -> Option<&'a (dyn Any + 'static)>;

    fn project_mut<'a>(
        &self,
        outer: &'a mut (dyn Any + 'static),
    ) -> Option<&'a mut (dyn Any + 'static)>;
}

impl<O: 'static, I: 'static> Projection for View<O, I> {
    fn project<'a>(&self, outer: &'a (dyn Any + 'static)) -> Option<&'a (dyn Any + 'static)> {
        let inner: &'a I = self.get(outer.downcast_ref::<O>()?);
        Some(inner)
    }

    fn project_mut<'a>(
        &self,
        outer: &'a mut (dyn Any + 'static),
    ) -> Option<&'a mut (dyn Any + 'static)> {
        let inner: &'a mut I = self.get_mut(outer.downcast_mut::<O>()?);
        Some(inner)
    }
}

/// 声明式的转换表
///
/// 每个 `View<O, I>` 登记一条 `I -> O` 的可转换关系。可转换关系沿视图传递：
/// `Person` 内嵌于 `Employee`、`Employee` 内嵌于 `Manager` 时，`Person` 也可转换为 `Manager`。
/// 相同类型总是可转换。
#[derive(Default)]
pub struct RecordViews {
    // (from, to) -> View<to, from>
    views: HashMap<(TypeDesc, TypeDesc), Arc<dyn Projection>>,
}

impl RecordViews {
    pub fn new() -> Self {
        Self::default()
    }

    /// 收集通过 `record_view!` 或 `#[view]` 注册的所有视图
    pub fn registered() -> Self {
        let mut views = Self::new();
        for registration in inventory::iter::<ViewRegistration>() {
            (registration.register)(&mut views);
        }
        log::debug!("collected {} registered record views", views.len());
        views
    }

    pub fn insert<O: 'static, I: 'static>(&mut self, view: View<O, I>) {
        let (from, to) = (TypeDesc::of::<I>(), TypeDesc::of::<O>());
        if from == to {
            return;
        }
        if self.views.insert((from, to), Arc::new(view)).is_some() {
            log::warn!("record view {from} -> {to} registered twice, keeping the latest");
        }
    }

    pub fn with<O: 'static, I: 'static>(mut self, view: View<O, I>) -> Self {
        self.insert(view);
        self
    }

    // 广度优先找最短的视图链，返回从外层开始的各条边
    fn path(&self, from: TypeDesc, to: TypeDesc) -> Option<Vec<(TypeDesc, TypeDesc)>> {
        let mut previous: HashMap<TypeDesc, TypeDesc> = HashMap::new();
        let mut queue = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            if current == to {
                let mut edges = Vec::new();
                let mut node = to;
                while let Some(&inner) = previous.get(&node) {
                    edges.push((inner, node));
                    node = inner;
                }
                return Some(edges);
            }
            for &(inner, outer) in self.views.keys() {
                if inner == current && outer != from && !previous.contains_key(&outer) {
                    previous.insert(outer, inner);
                    queue.push_back(outer);
                }
            }
        }
        None
    }

    /// 取出 `O -> I` 的视图，必要时把多层视图拼接起来
    pub fn view<O: 'static, I: 'static>(&self) -> Option<View<O, I>> {
        let edges = self.path(TypeDesc::of::<I>(), TypeDesc::of::<O>())?;
        if edges.len() > 1 {
            log::trace!(
                "composing {} record views for {} -> {}",
                edges.len(),
                TypeDesc::of::<I>(),
                TypeDesc::of::<O>()
            );
        }
        let hops = edges
            .iter()
            .filter_map(|edge| self.views.get(edge).cloned())
            .collect();
        Some(View::through(hops))
    }

    /// 直接登记的视图数量
    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

impl Convertibility for RecordViews {
    fn is_convertible(&self, from: TypeDesc, to: TypeDesc) -> bool {
        from == to || self.path(from, to).is_some()
    }
}

impl fmt::Debug for RecordViews {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.views.keys().map(|(from, to)| format!("{from} -> {to}")))
            .finish()
    }
}

// 链接期注册的视图
pub struct ViewRegistration {
    pub register: fn(&mut RecordViews),
}

inventory::collect!(ViewRegistration);

/// 注册一个从外层记录到内嵌字段的视图，使内嵌记录类型可转换为外层类型
///
/// ```ignore
/// kv_key::record_view!(Employee => Person: person);
/// ```
#[macro_export]
macro_rules! record_view {
    ($outer:ty => $inner:ty : $field:ident) => {
        $crate::inventory::submit! {
            $crate::ViewRegistration {
                register: |views: &mut $crate::RecordViews| {
                    views.insert($crate::View::<$outer, $inner>::new(
                        |outer| &outer.$field,
                        |outer| &mut outer.$field,
                    ));
                },
            }
        }
    };
}
