use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse_macro_input, Data, DataEnum, DeriveInput, ImplItem, ImplItemFn, ItemImpl,
    Stmt, Type, Variant, Visibility,
};

/// Turns a plain enum into a tally error type.
///
/// The attribute:
/// 1. Adds `#[derive(Debug, thiserror::Error, uniffi::Error)]` and `#[uniffi(flat_error)]`
/// 2. Appends a `Generic { message: String }` variant unless the enum already declares one
/// 3. Implements `From<anyhow::Error>`, flattening the context chain into `message`
///
/// # Usage
///
/// ```rust,ignore
/// #[tally_error]
/// pub enum StoreError {
///     #[error("key {key} is missing")]
///     Missing { key: String },
/// }
/// ```
#[proc_macro_attribute]
pub fn tally_error(_args: TokenStream, input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let Data::Enum(data_enum) = &input.data else {
        return syn::Error::new_spanned(&input, "tally_error can only be applied to enums")
            .to_compile_error()
            .into();
    };

    let enum_name = &input.ident;
    let visibility = &input.vis;
    let generics = &input.generics;

    // derive/uniffi attributes are re-emitted below
    let attrs: Vec<_> = input
        .attrs
        .iter()
        .filter(|attr| !attr.path().is_ident("derive") && !attr.path().is_ident("uniffi"))
        .collect();

    let variants = with_generic_variant(data_enum);

    quote! {
        #[derive(Debug, thiserror::Error, uniffi::Error)]
        #[uniffi(flat_error)]
        #(#attrs)*
        #visibility enum #enum_name #generics {
            #variants
        }

        impl #generics From<anyhow::Error> for #enum_name #generics {
            fn from(err: anyhow::Error) -> Self {
                Self::Generic {
                    message: {
                        let mut message = err.to_string();
                        let chain: Vec<String> =
                            err.chain().skip(1).map(|cause| cause.to_string()).collect();
                        if !chain.is_empty() {
                            message.push_str(" (caused by: ");
                            message.push_str(&chain.join(" -> "));
                            message.push(')');
                        }
                        message
                    },
                }
            }
        }
    }
    .into()
}

fn with_generic_variant(
    data_enum: &DataEnum,
) -> syn::punctuated::Punctuated<Variant, syn::token::Comma> {
    let mut variants = data_enum.variants.clone();
    if !variants.iter().any(|variant| variant.ident == "Generic") {
        let generic: Variant = syn::parse_quote! {
            /// Any other failure, carrying the flattened error chain.
            #[error("Generic error: {message}")]
            Generic {
                /// The flattened error chain.
                message: String
            }
        };
        variants.push(generic);
    }
    variants
}

/// Wraps `#[uniffi::export]` and opens a logging context named after the type
/// at the top of every `pub fn` in the impl block.
///
/// ```rust,ignore
/// #[tally_export]
/// impl DeviceIdController {
///     pub fn device_id(&self) -> Option<String> {
///         // `[DeviceIdController]` prefixes every log line emitted here
///         ...
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn tally_export(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_impl = parse_macro_input!(input as ItemImpl);
    let context_name = impl_type_name(&item_impl.self_ty);

    for item in &mut item_impl.items {
        if let ImplItem::Fn(method) = item {
            if matches!(method.vis, Visibility::Public(_)) {
                inject_logging_context(method, &context_name);
            }
        }
    }

    let args = proc_macro2::TokenStream::from(args);
    quote! {
        #[uniffi::export(#args)]
        #item_impl
    }
    .into()
}

fn impl_type_name(self_ty: &Type) -> String {
    match self_ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map_or_else(|| "Unknown".to_string(), |segment| segment.ident.to_string()),
        _ => "Unknown".to_string(),
    }
}

fn inject_logging_context(method: &mut ImplItemFn, context_name: &str) {
    let context_stmt: Stmt = syn::parse_quote! {
        let _tally_logger_ctx = crate::primitives::logger::LogContext::new(#context_name);
    };
    method.block.stmts.insert(0, context_stmt);
}
