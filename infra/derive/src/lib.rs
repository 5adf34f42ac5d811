#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by every crate of the workspace:
//!
//! * [`rollcall_error`] turns an enum into a context-aware `thiserror` error and, when
//!   variants are tagged with `#[code(...)]`, into an HTTP-mappable API error.
//! * [`rollcall_slice`] wraps feature state into an `Arc` handle registrable in the API state.
//! * [`api_model`] / [`api_handler`] keep DTOs and handlers consistent with the `OpenAPI` surface.
//!
//! Examples are `ignore`d because they only compile inside consuming crates.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, ItemStruct, parse_macro_input};

/// Defines a standard API data model.
///
/// # Injected Behaviors
///
/// * **Derives**: `Debug`, `Serialize`, `Deserialize` and `utoipa::ToSchema` if missing.
/// * **Serde Policy**: `rename_all = "camelCase"` and `deny_unknown_fields` by default.
///
/// # Arguments
///
/// * `rename_all = "..."` - Overrides the default Serde rename policy.
/// * `deny_unknown_fields = false` - Disables strict field checking (use it for response-only models
///   that are also read back by tests or clients with extra fields).
///
/// # Example
///
/// ```rust,ignore
/// use rollcall_derive::api_model;
///
/// #[api_model]
/// pub struct CreateCourseRequest {
///     pub name: String,
///     pub code: String,
/// }
/// ```
#[proc_macro_attribute]
pub fn api_model(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    macros::api::expand_api_model(attr.into(), input).into()
}

/// Bridges an Axum handler with `OpenAPI` documentation.
///
/// Accepts standard `utoipa::path` arguments (`get`, `post`, `path = "..."`, `params(...)`,
/// `responses(...)`, `tag = "..."`) and applies `#[allow(clippy::unused_async)]`.
///
/// ```rust,ignore
/// #[api_handler(get, path = "/health", responses((status = OK, body = HealthResponse)), tag = "System")]
/// pub async fn health_handler() -> impl IntoResponse { /* ... */ }
/// ```
#[proc_macro_attribute]
pub fn api_handler(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::api::expand_api_handler(args.into(), input).into()
}

/// Defines a domain-specific error enum.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]`.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to any `Result` that can be converted into this error type.
/// * **Standard Conversions**: Implements `From<T>` for variants containing a source field.
/// * **Internal Fallback**: `From<&'static str>` and `From<String>` when an `Internal` variant exists.
/// * **API Mapping**: Variants tagged `#[code(NotFound)]` (any `ErrorCode` variant) produce a
///   `From<Error> for rollcall_kernel::server::ApiError` impl. Untagged variants map to `Internal`.
///   The consuming crate must depend on `rollcall-kernel` when it uses `#[code]`.
///   `#[code(inherit)]` on a variant wrapping another slice's error reuses that error's mapping.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum** with named-field variants.
/// 2. Variants that support context must include a `context: Option<Cow<'static, str>>` field.
/// 3. Variants wrapping external errors must include a `source` field (or `#[source]`/`#[from]`)
///    together with a `context` field.
///
/// # Example
///
/// ```rust,ignore
/// use rollcall_derive::rollcall_error;
/// use std::borrow::Cow;
///
/// #[rollcall_error]
/// pub enum CourseError {
///     #[code(NotFound)]
///     #[error("Course not found{}: {message}", format_context(.context))]
///     NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
///
///     #[error("Database error{}: {source}", format_context(.context))]
///     Database { source: rollcall_database::DatabaseError, context: Option<Cow<'static, str>> },
///
///     #[error("Internal course error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
/// ```
#[proc_macro_attribute]
pub fn rollcall_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}

/// Defines a vertical slice handle.
///
/// Generates `<Name>Inner` with the declared fields, an `Arc`-backed `<Name>` wrapper with
/// `new` and `Deref`, and the `FeatureSlice` impl used by the API state registry.
///
/// ```rust,ignore
/// #[rollcall_derive::rollcall_slice]
/// pub struct Courses {
///     pub service: CourseService,
/// }
///
/// let slice = Courses::new(CoursesInner { service });
/// ```
#[proc_macro_attribute]
pub fn rollcall_slice(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as ItemStruct);
    macros::slice::expand_slice(input).into()
}
