use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DataStruct, DeriveInput, Field, Fields};

fn has_attr(field: &Field, name: &str) -> bool {
    field.attrs.iter().any(|attr| attr.path().is_ident(name))
}

pub(crate) fn expand(input: DeriveInput) -> syn::Result<TokenStream> {
    let struct_name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "KeyRecord cannot be derived for generic records",
        ));
    }

    let fields = match &input.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => &fields.named,
        _ => {
            return Err(syn::Error::new_spanned(
                struct_name,
                "KeyRecord can only be derived for structs with named fields",
            ));
        }
    };

    // 带 #[index] 的字段生成字段描述符
    let indexed: Vec<_> = fields
        .iter()
        .filter(|field| has_attr(field, "index"))
        .filter_map(|field| Some((field.ident.as_ref()?, &field.ty)))
        .collect();

    // 带 #[view] 的字段注册为内嵌记录视图
    let views: Vec<_> = fields
        .iter()
        .filter(|field| has_attr(field, "view"))
        .filter_map(|field| Some((field.ident.as_ref()?, &field.ty)))
        .collect();

    let selector_fns = indexed.iter().map(|(field_name, field_type)| {
        let fn_name = format_ident!("{}_key", field_name);
        let name_str = field_name.to_string();
        quote! {
            pub fn #fn_name() -> ::kv_key::KeySelector<Self, #field_type> {
                ::kv_key::KeySelector::field(#name_str, |record: &Self| &record.#field_name)
            }
        }
    });

    let selector_metas = indexed.iter().map(|(field_name, field_type)| {
        let name_str = field_name.to_string();
        quote! {
            ::kv_key::inventory::submit! {
                ::kv_key::SelectorMeta {
                    record: ::kv_key::TypeDesc::of::<#struct_name>,
                    record_path: concat!(module_path!(), "::", stringify!(#struct_name)),
                    name: #name_str,
                    kind: ::kv_key::SelectorKind::Field,
                    key: ::kv_key::TypeDesc::of::<#field_type>,
                }
            }
        }
    });

    let view_registrations = views.iter().map(|(field_name, field_type)| {
        quote! {
            ::kv_key::inventory::submit! {
                ::kv_key::ViewRegistration {
                    register: |views: &mut ::kv_key::RecordViews| {
                        views.insert(::kv_key::View::<#struct_name, #field_type>::new(
                            |outer| &outer.#field_name,
                            |outer| &mut outer.#field_name,
                        ));
                    },
                }
            }
        }
    });

    Ok(quote! {
        impl #struct_name {
            #(#selector_fns)*
        }

        #(#selector_metas)*

        #(#view_registrations)*
    })
}
