use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{
    parse::Parse, parse::ParseStream, Expr, FnArg, Ident, ItemFn, Lit, Pat, ReturnType, Token,
};

struct MacroArgs {
    namespace: String,
    ttl: Option<u64>,
    tenant: Ident,
    keys: Vec<Ident>,
    digest: Option<Ident>,
}

fn parse_param(input: ParseStream, attr: &str) -> syn::Result<Ident> {
    let expr: Expr = input.parse()?;
    if let Expr::Path(ref path) = expr {
        if let Some(ident) = path.path.get_ident() {
            return Ok(ident.clone());
        }
    }
    Err(syn::Error::new_spanned(
        expr,
        format!("{} must be a parameter name", attr),
    ))
}

impl Parse for MacroArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut namespace = None;
        let mut ttl = None;
        let mut tenant = None;
        let mut keys = Vec::new();
        let mut digest = None;

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "namespace" => {
                    let lit: Lit = input.parse()?;
                    if let Lit::Str(s) = lit {
                        namespace = Some(s.value());
                    } else {
                        return Err(syn::Error::new(
                            lit.span(),
                            "namespace must be a string literal",
                        ));
                    }
                }
                "ttl" => {
                    let lit: Lit = input.parse()?;
                    if let Lit::Int(i) = lit {
                        ttl = Some(i.base10_parse()?);
                    } else {
                        return Err(syn::Error::new(lit.span(), "ttl must be an integer"));
                    }
                }
                "tenant" => tenant = Some(parse_param(input, "tenant")?),
                "key" => keys.push(parse_param(input, "key")?),
                "digest" => {
                    if digest.is_some() {
                        return Err(syn::Error::new(
                            ident.span(),
                            "digest may only be given once",
                        ));
                    }
                    digest = Some(parse_param(input, "digest")?);
                }
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!(
                            "unknown attribute `{}`, expected `namespace`, `ttl`, `tenant`, `key`, or `digest`",
                            other
                        ),
                    ));
                }
            }

            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        let namespace = namespace.ok_or_else(|| {
            syn::Error::new(input.span(), "missing required attribute `namespace`")
        })?;
        let tenant = tenant
            .ok_or_else(|| syn::Error::new(input.span(), "missing required attribute `tenant`"))?;
        if keys.is_empty() && digest.is_none() {
            return Err(syn::Error::new(
                input.span(),
                "at least one `key` or a `digest` is required",
            ));
        }

        Ok(MacroArgs {
            namespace,
            ttl,
            tenant,
            keys,
            digest,
        })
    }
}

/// Wrap an async `&self` method in cache-aside logic on `self.cache`.
///
/// ```ignore
/// #[tenant_cached(namespace = "forecast", ttl = 300, tenant = tenant, key = product_id, digest = request)]
/// pub async fn forecast(&self, tenant: &str, product_id: &str, request: ForecastRequest)
///     -> AppResult<ForecastReport> { ... }
/// ```
///
/// The original body moves into a private `__<name>_uncached` method. The
/// error type must implement `From<CacheError>` so that key errors surface.
#[proc_macro_attribute]
pub fn tenant_cached(args: TokenStream, input: TokenStream) -> TokenStream {
    expand(args.into(), input.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn expand(args: TokenStream2, input: TokenStream2) -> syn::Result<TokenStream2> {
    let args: MacroArgs = syn::parse2(args)?;
    let input_fn: ItemFn = syn::parse2(input)?;

    let sig = &input_fn.sig;
    if sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            sig.fn_token,
            "tenant_cached only supports async functions",
        ));
    }
    if !matches!(sig.inputs.first(), Some(FnArg::Receiver(_))) {
        return Err(syn::Error::new_spanned(
            &sig.ident,
            "tenant_cached requires a `&self` method",
        ));
    }
    if matches!(sig.output, ReturnType::Default) {
        return Err(syn::Error::new_spanned(
            &sig.ident,
            "tenant_cached requires a Result return type",
        ));
    }

    let mut param_names = Vec::new();
    for arg in sig.inputs.iter().skip(1) {
        match arg {
            FnArg::Typed(pat_type) => match &*pat_type.pat {
                Pat::Ident(pat_ident) => param_names.push(pat_ident.ident.clone()),
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "tenant_cached parameters must be plain identifiers",
                    ))
                }
            },
            FnArg::Receiver(receiver) => {
                return Err(syn::Error::new_spanned(receiver, "unexpected receiver"))
            }
        }
    }

    let referenced = std::iter::once(&args.tenant)
        .chain(args.keys.iter())
        .chain(args.digest.iter());
    for ident in referenced {
        if !param_names.contains(ident) {
            return Err(syn::Error::new(
                ident.span(),
                format!("`{}` is not a parameter of this function", ident),
            ));
        }
    }

    let namespace = &args.namespace;
    let tenant = &args.tenant;
    let keys = &args.keys;
    let ttl_expr = match args.ttl {
        Some(ttl) => quote! { ::core::option::Option::Some(#ttl) },
        None => quote! { ::core::option::Option::None },
    };

    let key_expr = match &args.digest {
        Some(digest) => quote! {
            crate::cache::CacheKey::with_digest(
                ::core::convert::AsRef::<str>::as_ref(&#tenant),
                #namespace,
                &__parts,
                &#digest,
            )?
        },
        None => quote! {
            crate::cache::CacheKey::new(
                ::core::convert::AsRef::<str>::as_ref(&#tenant),
                #namespace,
                &__parts,
            )?
        },
    };

    let fn_attrs = &input_fn.attrs;
    let fn_vis = &input_fn.vis;
    let fn_name = &sig.ident;
    let fn_inputs = &sig.inputs;
    let fn_output = &sig.output;
    let fn_generics = &sig.generics;
    let where_clause = &sig.generics.where_clause;
    let fn_body = &input_fn.block;
    let inner_name = format_ident!("__{}_uncached", fn_name, span = Span::call_site());

    Ok(quote! {
        #(#fn_attrs)*
        #fn_vis async fn #fn_name #fn_generics(#fn_inputs) #fn_output #where_clause {
            let __key = {
                let __parts: ::std::vec::Vec<::std::string::String> = ::std::vec![
                    #(::std::string::ToString::to_string(&#keys)),*
                ];
                #key_expr
            };
            self.cache
                .cache_aside(&__key, #ttl_expr, move || self.#inner_name(#(#param_names),*))
                .await
        }

        #[doc(hidden)]
        async fn #inner_name #fn_generics(#fn_inputs) #fn_output #where_clause #fn_body
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_args(src: &str) -> syn::Result<MacroArgs> {
        syn::parse_str::<MacroArgs>(src)
    }

    #[test]
    fn test_parse_full_args() {
        let args = parse_args(
            r#"namespace = "forecast", ttl = 300, tenant = tenant, key = product_id, digest = request"#,
        )
        .unwrap();
        assert_eq!(args.namespace, "forecast");
        assert_eq!(args.ttl, Some(300));
        assert_eq!(args.tenant, "tenant");
        assert_eq!(args.keys.len(), 1);
        assert_eq!(args.keys[0], "product_id");
        assert_eq!(args.digest.unwrap(), "request");
    }

    #[test]
    fn test_parse_repeated_keys() {
        let args = parse_args(r#"namespace = "stock", tenant = t, key = a, key = b"#).unwrap();
        assert_eq!(args.keys.len(), 2);
        assert!(args.ttl.is_none());
        assert!(args.digest.is_none());
    }

    #[test]
    fn test_missing_namespace() {
        let err = parse_args("tenant = t, key = a").err().unwrap();
        assert!(err.to_string().contains("namespace"));
    }

    #[test]
    fn test_missing_tenant() {
        let err = parse_args(r#"namespace = "ns", key = a"#).err().unwrap();
        assert!(err.to_string().contains("tenant"));
    }

    #[test]
    fn test_missing_key_and_digest() {
        let err = parse_args(r#"namespace = "ns", tenant = t"#).err().unwrap();
        assert!(err.to_string().contains("digest"));
    }

    #[test]
    fn test_invalid_ttl_type() {
        let err = parse_args(r#"namespace = "ns", ttl = "60", tenant = t, key = a"#)
            .err()
            .unwrap();
        assert!(err.to_string().contains("ttl must be an integer"));
    }

    #[test]
    fn test_unknown_attribute() {
        let err = parse_args(r#"namespace = "ns", tenant = t, key = a, name = "x""#)
            .err()
            .unwrap();
        assert!(err.to_string().contains("unknown attribute"));
    }

    #[test]
    fn test_duplicate_digest() {
        let err = parse_args(r#"namespace = "ns", tenant = t, digest = a, digest = b"#)
            .err()
            .unwrap();
        assert!(err.to_string().contains("once"));
    }

    #[test]
    fn test_expand_generates_inner_method() {
        let args = quote! { namespace = "abc", ttl = 60, tenant = tenant, digest = request };
        let input = quote! {
            pub async fn analyse(&self, tenant: &str, request: Request) -> AppResult<Report> {
                compute(request)
            }
        };
        let output = expand(args, input).unwrap().to_string();
        assert!(output.contains("__analyse_uncached"));
        assert!(output.contains("cache_aside"));
        assert!(output.contains("with_digest"));
    }

    #[test]
    fn test_expand_rejects_unknown_param() {
        let args = quote! { namespace = "abc", tenant = tenant, key = missing };
        let input = quote! {
            async fn analyse(&self, tenant: &str) -> AppResult<Report> { todo!() }
        };
        let err = expand(args, input).err().unwrap();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_expand_rejects_free_function() {
        let args = quote! { namespace = "abc", tenant = tenant, key = id };
        let input = quote! {
            async fn analyse(tenant: &str, id: u32) -> AppResult<Report> { todo!() }
        };
        assert!(expand(args, input).is_err());
    }

    #[test]
    fn test_expand_rejects_sync_function() {
        let args = quote! { namespace = "abc", tenant = tenant, key = id };
        let input = quote! {
            fn analyse(&self, tenant: &str, id: u32) -> AppResult<Report> { todo!() }
        };
        assert!(expand(args, input).is_err());
    }
}
