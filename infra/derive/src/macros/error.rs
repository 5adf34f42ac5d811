use crate::macros::api::derived_trait_names;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, Ident, Type, Variant};

struct VariantMeta {
    ident: Ident,
    source_ty: Option<Type>,
    source_field: Option<Ident>,
    has_context: bool,
    code: Option<Ident>,
}

pub fn expand_derive(mut input: DeriveInput) -> TokenStream {
    let name = input.ident.clone();
    let trait_name = format_ident!("{}Ext", name);

    let Data::Enum(data) = &mut input.data else {
        return quote! { compile_error!("rollcall_error can only be applied to enums"); };
    };

    let mut variants = Vec::with_capacity(data.variants.len());
    for variant in &mut data.variants {
        match parse_variant(variant) {
            Ok(meta) => variants.push(meta),
            Err(err) => return err.to_compile_error(),
        }
    }

    if let Some(v) = variants.iter().find(|v| v.source_ty.is_some() && !v.has_context) {
        return syn::Error::new_spanned(
            &v.ident,
            "rollcall_error requires `context: Option<Cow<'static, str>>` for variants with a source",
        )
        .to_compile_error();
    }

    let derived = derived_trait_names(&input.attrs);
    let mut derives = Vec::new();
    if !derived.contains("Debug") {
        derives.push(quote! { Debug });
    }
    if !derived.contains("Error") {
        derives.push(quote! { ::thiserror::Error });
    }
    let derive_attr =
        if derives.is_empty() { quote! {} } else { quote! { #[derive(#(#derives),*)] } };

    let context_impl = context_trait(&name, &trait_name, &variants);
    let from_impls = variants.iter().filter_map(|v| source_from_impl(&name, &trait_name, v));
    let internal_impls = internal_from_impls(&name, &variants);
    let api_impl = api_error_impl(&name, &variants);

    quote! {
        #[allow(non_shorthand_field_patterns)]
        #derive_attr
        #input

        #context_impl
        #(#from_impls)*
        #internal_impls
        #api_impl

        #[allow(dead_code)]
        fn format_context(context: &Option<std::borrow::Cow<'static, str>>) -> std::borrow::Cow<'static, str> {
            context.as_ref().map_or(std::borrow::Cow::Borrowed(""), |c| std::borrow::Cow::Owned(format!(" ({c})")))
        }
    }
}

/// Reads the variant layout and strips the `#[code(...)]` marker so it does not reach rustc.
fn parse_variant(v: &mut Variant) -> syn::Result<VariantMeta> {
    let mut code = None;
    let mut kept = Vec::with_capacity(v.attrs.len());
    for attr in v.attrs.drain(..) {
        if attr.path().is_ident("code") {
            if code.is_some() {
                return Err(syn::Error::new_spanned(attr, "duplicate #[code] attribute"));
            }
            code = Some(attr.parse_args::<Ident>()?);
        } else {
            kept.push(attr);
        }
    }
    v.attrs = kept;

    let Fields::Named(fields) = &v.fields else {
        return Err(syn::Error::new_spanned(
            &v.ident,
            "rollcall_error requires named fields for source/context handling",
        ));
    };

    let mut has_context = false;
    let mut source = None;
    for field in &fields.named {
        let Some(ident) = &field.ident else { continue };
        if ident == "context" {
            if !is_context_type(&field.ty) {
                return Err(syn::Error::new_spanned(
                    &field.ty,
                    "context field must be Option<Cow<'static, str>>",
                ));
            }
            has_context = true;
        } else if source.is_none()
            && (ident == "source"
                || field.attrs.iter().any(|a| a.path().is_ident("source") || a.path().is_ident("from")))
        {
            source = Some((ident.clone(), field.ty.clone()));
        }
    }

    let (source_field, source_ty) = source.unzip();
    Ok(VariantMeta { ident: v.ident.clone(), source_ty, source_field, has_context, code })
}

fn context_trait(name: &Ident, trait_name: &Ident, variants: &[VariantMeta]) -> TokenStream {
    let arms = variants.iter().filter(|v| v.has_context).map(|v| {
        let ident = &v.ident;
        quote! { #name::#ident { context: c, .. } => *c = Some(context.into()), }
    });

    quote! {
        pub trait #trait_name<T> {
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Result<T, #name>;
        }

        #[automatically_derived]
        impl<T> #trait_name<T> for Result<T, #name> {
            #[inline]
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Self {
                self.map_err(|mut e| {
                    match &mut e {
                        #( #arms )*
                        #[allow(unreachable_patterns)]
                        _ => {}
                    }
                    e
                })
            }
        }
    }
}

fn source_from_impl(name: &Ident, trait_name: &Ident, v: &VariantMeta) -> Option<TokenStream> {
    if v.ident == "Internal" {
        return None;
    }
    let source_ty = v.source_ty.as_ref()?;
    let source_field = v.source_field.as_ref()?;
    let v_ident = &v.ident;

    Some(quote! {
        #[automatically_derived]
        impl From<#source_ty> for #name {
            #[inline]
            fn from(#source_field: #source_ty) -> Self { Self::#v_ident { #source_field, context: None } }
        }

        impl<T> #trait_name<T> for std::result::Result<T, #source_ty> {
            #[inline]
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> std::result::Result<T, #name> {
                self.map_err(|#source_field| #name::#v_ident { #source_field, context: Some(context.into()) })
            }
        }
    })
}

fn internal_from_impls(name: &Ident, variants: &[VariantMeta]) -> TokenStream {
    if !variants.iter().any(|v| v.ident == "Internal") {
        return quote!();
    }

    quote! {
        impl From<&'static str> for #name {
            #[inline]
            fn from(s: &'static str) -> Self { Self::Internal { message: std::borrow::Cow::Borrowed(s), context: None } }
        }
        impl From<String> for #name {
            #[inline]
            fn from(s: String) -> Self { Self::Internal { message: std::borrow::Cow::Owned(s), context: None } }
        }
    }
}

/// Emits the conversion into the kernel's HTTP error when at least one variant is tagged.
///
/// `#[code(inherit)]` on a source variant defers to the source's own `ApiError` conversion.
fn api_error_impl(name: &Ident, variants: &[VariantMeta]) -> TokenStream {
    if variants.iter().all(|v| v.code.is_none()) {
        return quote!();
    }

    let inherited = variants.iter().filter(|v| is_inherit(v)).map(|v| {
        let ident = &v.ident;
        match &v.source_field {
            Some(field) => quote! {
                #name::#ident { #field: inner, .. } => ::rollcall_kernel::server::ApiError::from(inner),
            },
            None => syn::Error::new_spanned(ident, "#[code(inherit)] requires a source field")
                .to_compile_error(),
        }
    });

    let arms = variants.iter().filter(|v| !is_inherit(v)).filter_map(|v| {
        let ident = &v.ident;
        let code = v.code.as_ref()?;
        Some(quote! { #name::#ident { .. } => ::rollcall_kernel::server::ErrorCode::#code, })
    });

    quote! {
        #[automatically_derived]
        impl From<#name> for ::rollcall_kernel::server::ApiError {
            fn from(err: #name) -> Self {
                match err {
                    #( #inherited )*
                    #[allow(unreachable_patterns)]
                    err => {
                        let code = match &err {
                            #( #arms )*
                            #[allow(unreachable_patterns)]
                            _ => ::rollcall_kernel::server::ErrorCode::Internal,
                        };
                        ::rollcall_kernel::server::ApiError::new(code, err.to_string())
                    },
                }
            }
        }
    }
}

fn is_inherit(v: &VariantMeta) -> bool {
    v.code.as_ref().is_some_and(|code| code == "inherit")
}

fn is_context_type(ty: &Type) -> bool {
    let Some(option) = last_segment(ty) else { return false };
    if option.ident != "Option" {
        return false;
    }
    let Some(syn::GenericArgument::Type(inner)) = generic_args(option).and_then(|a| a.first())
    else {
        return false;
    };
    let Some(cow) = last_segment(inner) else { return false };
    if cow.ident != "Cow" {
        return false;
    }
    let Some(args) = generic_args(cow) else { return false };
    let mut args = args.iter();
    let Some(syn::GenericArgument::Lifetime(lt)) = args.next() else { return false };
    let Some(syn::GenericArgument::Type(str_ty)) = args.next() else { return false };
    lt.ident == "static" && last_segment(str_ty).is_some_and(|seg| seg.ident == "str")
}

fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    let Type::Path(path) = ty else { return None };
    path.path.segments.last()
}

fn generic_args(
    segment: &syn::PathSegment,
) -> Option<&syn::punctuated::Punctuated<syn::GenericArgument, syn::Token![,]>> {
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else { return None };
    Some(&args.args)
}
