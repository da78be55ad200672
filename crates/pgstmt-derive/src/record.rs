//! Record derive macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

#[derive(Default)]
struct FieldAttrs {
    column: Option<String>,
    pk: bool,
    starts_with: bool,
    ends_with: bool,
    contains: bool,
    skip: bool,
}

impl syn::parse::Parse for FieldAttrs {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attrs = FieldAttrs::default();

        loop {
            if input.is_empty() {
                break;
            }

            let ident: syn::Ident = input.parse()?;
            let key = ident.to_string();

            match key.as_str() {
                "pk" => attrs.pk = true,
                "starts_with" => attrs.starts_with = true,
                "ends_with" => attrs.ends_with = true,
                "contains" => attrs.contains = true,
                "skip" => attrs.skip = true,
                "column" => {
                    let _: syn::Token![=] = input.parse()?;
                    let value: syn::LitStr = input.parse()?;
                    attrs.column = Some(value.value());
                }
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown sql attribute `{other}`"),
                    ));
                }
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        Ok(attrs)
    }
}

fn get_field_attrs(field: &syn::Field) -> Result<FieldAttrs> {
    let mut attrs = FieldAttrs::default();
    for attr in &field.attrs {
        if attr.path().is_ident("sql") {
            attrs = attr.parse_args::<FieldAttrs>()?;
        }
    }
    Ok(attrs)
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Record can only be derived for structs",
            ));
        }
    };

    let mut field_exprs: Vec<TokenStream> = Vec::new();
    for field in fields.iter() {
        let field_ident = field.ident.clone().unwrap();
        let attrs = get_field_attrs(field)?;
        if attrs.skip {
            continue;
        }

        let column = attrs.column.unwrap_or_else(|| field_ident.to_string());
        let mut expr = quote! {
            ::pgstmt::FieldValue::new(#column, ::pgstmt::Value::from(self.#field_ident.clone()))
        };
        if attrs.pk {
            expr = quote! { #expr.primary_key() };
        }
        if attrs.starts_with {
            expr = quote! { #expr.starts_with() };
        } else if attrs.ends_with {
            expr = quote! { #expr.ends_with() };
        } else if attrs.contains {
            expr = quote! { #expr.contains() };
        }
        field_exprs.push(expr);
    }

    Ok(quote! {
        impl #impl_generics ::pgstmt::Record for #name #ty_generics #where_clause {
            fn field_values(&self) -> ::std::vec::Vec<::pgstmt::FieldValue> {
                ::std::vec![
                    #(#field_exprs),*
                ]
            }
        }
    })
}
