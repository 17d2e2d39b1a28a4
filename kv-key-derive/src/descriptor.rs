use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{
    Expr, ExprCall, ExprField, ExprPath, ExprReference, Member, Path, Token,
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
};

// 与 kv_key::MAX_ARITY 保持一致，过程宏 crate 无法依赖 kv-key
const MAX_ARITY: usize = 10;

/// 按书写形态识别出的描述符
#[derive(Debug)]
pub(crate) enum Descriptor {
    /// `Record.field`
    Field { record: Path, member: Member },
    /// `Record::method()`，书写上不区分 `&self` 与 `&mut self`
    Accessor { method: Path },
    /// `&mut Record::method()`
    AccessorMut { method: Path },
    /// `function(&Record)` 或 `function(Record)`
    Function {
        function: Path,
        record: Path,
        by_ref: bool,
    },
}

pub(crate) struct KeyList {
    descriptors: Vec<Expr>,
}

impl Parse for KeyList {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let descriptors = Punctuated::<Expr, Token![,]>::parse_terminated(input)?;
        Ok(Self {
            descriptors: descriptors.into_iter().collect(),
        })
    }
}

fn plain_path(expr: &Expr) -> Option<&Path> {
    match expr {
        Expr::Path(ExprPath {
            qself: None, path, ..
        }) => Some(path),
        _ => None,
    }
}

// `Type::method`，至少两段
fn method_path(expr: &Expr) -> Option<&Path> {
    plain_path(expr).filter(|path| path.segments.len() >= 2)
}

fn zero_arg_method(expr: &Expr) -> Option<&Path> {
    match expr {
        Expr::Call(ExprCall { func, args, .. }) if args.is_empty() => method_path(func),
        _ => None,
    }
}

/// 依次尝试字段、只读方法、可变方法、自由函数四种形态，先匹配者胜出
pub(crate) fn classify(expr: &Expr) -> syn::Result<Descriptor> {
    if let Expr::Field(ExprField { base, member, .. }) = expr {
        if let Some(record) = plain_path(base) {
            return Ok(Descriptor::Field {
                record: record.clone(),
                member: member.clone(),
            });
        }
    }

    if let Some(method) = zero_arg_method(expr) {
        return Ok(Descriptor::Accessor {
            method: method.clone(),
        });
    }

    if let Expr::Reference(ExprReference {
        mutability: Some(_),
        expr: inner,
        ..
    }) = expr
    {
        if let Some(method) = zero_arg_method(inner) {
            return Ok(Descriptor::AccessorMut {
                method: method.clone(),
            });
        }
    }

    if let Expr::Call(ExprCall { func, args, .. }) = expr {
        if let (Some(function), 1) = (plain_path(func), args.len()) {
            let (record, by_ref) = match &args[0] {
                Expr::Reference(ExprReference {
                    mutability: None,
                    expr: record,
                    ..
                }) => (plain_path(record), true),
                record => (plain_path(record), false),
            };
            if let Some(record) = record {
                return Ok(Descriptor::Function {
                    function: function.clone(),
                    record: record.clone(),
                    by_ref,
                });
            }
        }
    }

    Err(syn::Error::new_spanned(
        expr,
        "unrecognized key-extraction descriptor shape; expected `Record.field`, \
         `Record::method()`, `&mut Record::method()`, `function(&Record)` or `function(Record)`",
    ))
}

fn last_ident(path: &Path) -> String {
    path.segments
        .last()
        .map(|segment| segment.ident.to_string())
        .unwrap_or_default()
}

impl Descriptor {
    pub(crate) fn name(&self) -> String {
        match self {
            Descriptor::Field { member, .. } => match member {
                Member::Named(ident) => ident.to_string(),
                Member::Unnamed(index) => index.index.to_string(),
            },
            Descriptor::Accessor { method } | Descriptor::AccessorMut { method } => {
                last_ident(method)
            }
            Descriptor::Function { function, .. } => last_ident(function),
        }
    }

    pub(crate) fn expand(&self) -> TokenStream {
        let name = self.name();
        match self {
            Descriptor::Field { record, member } => quote! {
                ::kv_key::KeySelector::field(#name, |record: &#record| &record.#member)
            },
            Descriptor::Accessor { method } => quote! {
                ::kv_key::KeySelector::accessor(#name, #method)
            },
            Descriptor::AccessorMut { method } => quote! {
                ::kv_key::KeySelector::accessor_mut(#name, #method)
            },
            Descriptor::Function {
                function,
                record,
                by_ref: true,
            } => quote! {
                ::kv_key::KeySelector::function(#name, |record: &#record| #function(record))
            },
            Descriptor::Function {
                function,
                record,
                by_ref: false,
            } => quote! {
                ::kv_key::KeySelector::function_owned(#name, |record: #record| #function(record))
            },
        }
    }
}

pub(crate) fn expand(list: KeyList) -> syn::Result<TokenStream> {
    let count = list.descriptors.len();
    if count == 0 || count > MAX_ARITY {
        return Err(syn::Error::new(
            Span::call_site(),
            format!(
                "selector count exceeds maximum supported composite arity: got {}, supported 1..={}",
                count, MAX_ARITY
            ),
        ));
    }

    let mut selectors = Vec::with_capacity(count);
    let mut errors: Option<syn::Error> = None;
    for expr in &list.descriptors {
        match classify(expr) {
            Ok(descriptor) => selectors.push(descriptor.expand()),
            Err(err) => match errors.as_mut() {
                Some(errors) => errors.combine(err),
                None => errors = Some(err),
            },
        }
    }
    if let Some(errors) = errors {
        return Err(errors);
    }

    Ok(quote! {
        ::kv_key::KeySpec::new((#(#selectors,)*))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn classify_field() {
        let descriptor = classify(&parse_quote!(Person.age)).unwrap();
        assert!(matches!(descriptor, Descriptor::Field { .. }));
        assert_eq!(descriptor.name(), "age");

        let tuple = classify(&parse_quote!(model::Pair.0)).unwrap();
        assert_eq!(tuple.name(), "0");
    }

    #[test]
    fn classify_accessors() {
        let read = classify(&parse_quote!(Person::full_name())).unwrap();
        assert!(matches!(read, Descriptor::Accessor { .. }));
        assert_eq!(read.name(), "full_name");

        let write = classify(&parse_quote!(&mut Person::next_ticket())).unwrap();
        assert!(matches!(write, Descriptor::AccessorMut { .. }));
        assert_eq!(write.name(), "next_ticket");
    }

    #[test]
    fn mutation_is_read_from_syntax_only() {
        let plain = classify(&parse_quote!(Person::next_ticket())).unwrap();
        assert!(matches!(plain, Descriptor::Accessor { .. }));
        assert!(plain.expand().to_string().contains("accessor ("));

        let marked = classify(&parse_quote!(&mut Person::next_ticket())).unwrap();
        assert!(matches!(marked, Descriptor::AccessorMut { .. }));
        assert!(marked.expand().to_string().contains("accessor_mut"));
    }

    #[test]
    fn classify_functions() {
        let by_ref = classify(&parse_quote!(extract_zip(&Person))).unwrap();
        assert!(matches!(by_ref, Descriptor::Function { by_ref: true, .. }));
        assert_eq!(by_ref.name(), "extract_zip");

        let by_value = classify(&parse_quote!(zip::of(Person))).unwrap();
        assert!(matches!(by_value, Descriptor::Function { by_ref: false, .. }));
        assert_eq!(by_value.name(), "of");
    }

    #[test]
    fn reject_unknown_shapes() {
        let shapes: [Expr; 6] = [
            parse_quote!(42),
            parse_quote!(|p: &Person| p.age),
            parse_quote!(full_name()),
            parse_quote!(&Person::full_name()),
            parse_quote!(extract_zip(&mut Person)),
            parse_quote!(Person::between(1, 2)),
        ];
        for expr in shapes {
            let err = classify(&expr).unwrap_err();
            assert!(
                err.to_string()
                    .starts_with("unrecognized key-extraction descriptor shape")
            );
        }
    }

    #[test]
    fn arity_checked_before_classification() {
        let empty: KeyList = syn::parse2(quote!()).unwrap();
        assert!(expand(empty).unwrap_err().to_string().contains("got 0"));

        let too_many: KeyList =
            syn::parse2(quote!(A.a, A.b, A.c, A.d, A.e, A.f, A.g, A.h, A.i, A.j, 42)).unwrap();
        assert!(too_many.descriptors.len() > MAX_ARITY);
        assert!(expand(too_many).unwrap_err().to_string().contains("got 11"));
    }

    #[test]
    fn expand_keeps_declaration_order() {
        let list: KeyList = syn::parse2(quote!(
            Person.age,
            Person::full_name(),
            &mut Person::next_ticket(),
            extract_zip(&Person),
        ))
        .unwrap();
        let expanded = expand(list).unwrap().to_string();
        let positions: Vec<_> = ["field", "accessor (", "accessor_mut", "function"]
            .iter()
            .map(|needle| expanded.find(needle).unwrap())
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
