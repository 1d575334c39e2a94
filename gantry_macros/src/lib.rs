use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, parse_quote, Data, DeriveInput, Fields, GenericParam, LitStr, Result as SynResult,
};

/// Field naming namespaces understood by `#[reflect(...)]`.
const NAMESPACES: [&str; 5] = ["json", "form", "header", "path", "xml"];

#[derive(Default)]
struct FieldAttrs {
    names: Vec<(String, String)>,
    rename: Option<String>,
    skip: bool,
    flatten: bool,
    description: Option<String>,
    required: bool,
    email: bool,
    format: Option<String>,
}

impl FieldAttrs {
    fn parse(attrs: &[syn::Attribute]) -> SynResult<Self> {
        let mut out = FieldAttrs::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("reflect")) {
            attr.parse_nested_meta(|meta| {
                if let Some(ns) = NAMESPACES.iter().find(|ns| meta.path.is_ident(ns)) {
                    let value: LitStr = meta.value()?.parse()?;
                    out.names.push((ns.to_string(), value.value()));
                } else if meta.path.is_ident("rename") {
                    let value: LitStr = meta.value()?.parse()?;
                    out.rename = Some(value.value());
                } else if meta.path.is_ident("description") {
                    let value: LitStr = meta.value()?.parse()?;
                    out.description = Some(value.value());
                } else if meta.path.is_ident("format") {
                    let value: LitStr = meta.value()?.parse()?;
                    out.format = Some(value.value());
                } else if meta.path.is_ident("skip") {
                    out.skip = true;
                } else if meta.path.is_ident("flatten") {
                    out.flatten = true;
                } else if meta.path.is_ident("required") {
                    out.required = true;
                } else if meta.path.is_ident("email") {
                    out.email = true;
                } else {
                    return Err(meta.error("unsupported reflect attribute"));
                }
                Ok(())
            })?;
        }
        Ok(out)
    }
}

fn container_name(input: &DeriveInput) -> SynResult<String> {
    let mut name = input.ident.to_string();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("reflect")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                name = value.value();
                Ok(())
            } else {
                Err(meta.error("unsupported reflect container attribute"))
            }
        })?;
    }
    Ok(name)
}

fn opt_str(value: &Option<String>) -> TokenStream2 {
    match value {
        Some(v) => quote! { ::core::option::Option::Some(#v) },
        None => quote! { ::core::option::Option::None },
    }
}

fn struct_body(fields: &Fields, type_name: &str) -> SynResult<TokenStream2> {
    match fields {
        Fields::Named(named) => {
            let mut calls = Vec::with_capacity(named.named.len());
            for field in &named.named {
                let attrs = FieldAttrs::parse(&field.attrs)?;
                let ident = field
                    .ident
                    .as_ref()
                    .ok_or_else(|| syn::Error::new_spanned(field, "expected named field"))?;
                if attrs.flatten {
                    calls.push(quote! { object.flatten(&self.#ident); });
                    continue;
                }
                let ident_str = ident.to_string();
                let ident_str = ident_str.strip_prefix("r#").unwrap_or(&ident_str);
                let names = attrs.names.iter().map(|(ns, n)| quote! { (#ns, #n) });
                let rename = opt_str(&attrs.rename);
                let description = opt_str(&attrs.description);
                let format = opt_str(&attrs.format);
                let skip = attrs.skip;
                let required = attrs.required;
                let email = attrs.email;
                calls.push(quote! {
                    object.field(&self.#ident, &::gantry::schema::FieldMeta {
                        ident: #ident_str,
                        rename: #rename,
                        names: &[#(#names),*],
                        skip: #skip,
                        description: #description,
                        required: #required,
                        email: #email,
                        format: #format,
                    });
                });
            }
            Ok(quote! {
                builder.object::<Self, _>(#type_name, |object| {
                    #(#calls)*
                })
            })
        }
        Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
            Ok(quote! { ::gantry::schema::Reflect::reflect(&self.0, builder) })
        }
        Fields::Unnamed(unnamed) => Err(syn::Error::new_spanned(
            unnamed,
            "Reflect supports named-field structs and single-field newtypes",
        )),
        Fields::Unit => Ok(quote! {
            builder.object::<Self, _>(#type_name, |_object| {})
        }),
    }
}

fn enum_body(data: &syn::DataEnum) -> SynResult<TokenStream2> {
    let mut values = Vec::with_capacity(data.variants.len());
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "Reflect supports enums with unit variants only",
            ));
        }
        let attrs = FieldAttrs::parse(&variant.attrs)?;
        if attrs.skip {
            continue;
        }
        values.push(attrs.rename.unwrap_or_else(|| variant.ident.to_string()));
    }
    Ok(quote! {
        let mut schema = ::gantry::schema::Schema::string();
        schema.enumeration = ::std::vec![#(::std::string::String::from(#values)),*];
        schema
    })
}

/// Derive `gantry::schema::Reflect`.
///
/// Named-field structs compile to object schemas, single-field tuple structs
/// are transparent, unit-only enums compile to string enums.
///
/// Field attributes: `json`/`form`/`header`/`path`/`xml = "name"` (query strings use `form`),
/// `rename = "name"`, `skip`, `flatten`, `description = ".."`, `required`,
/// `email`, `format = ".."`. Container attribute: `name = "TypeName"`.
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(mut input: DeriveInput) -> SynResult<TokenStream2> {
    let type_name = container_name(&input)?;
    let body = match &input.data {
        Data::Struct(data) => struct_body(&data.fields, &type_name)?,
        Data::Enum(data) => enum_body(data)?,
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Reflect cannot be derived for unions",
            ))
        }
    };

    for param in &mut input.generics.params {
        if let GenericParam::Type(ty) = param {
            ty.bounds.push(parse_quote!(::gantry::schema::Reflect));
            ty.bounds.push(parse_quote!('static));
        }
    }
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::gantry::schema::Reflect for #ident #ty_generics #where_clause {
            fn reflect(
                &self,
                builder: &mut ::gantry::schema::SchemaBuilder<'_>,
            ) -> ::gantry::schema::Schema {
                #body
            }
        }
    })
}
