// vim: tw=80
//! Trait adapter for use with Dynamock
//!
//! You probably don't want to use this crate directly.  Instead, use its
//! reexport via the [`dynamock`](../dynamock/index.html) crate.

#![cfg_attr(feature = "nightly_derive", feature(proc_macro_diagnostic))]
extern crate proc_macro;

use cfg_if::cfg_if;
use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::{
    *,
    ext::IdentExt,
    spanned::Spanned
};

cfg_if! {
    // proc-macro2's Span::unstable method requires the nightly feature, and it
    // doesn't work in test mode.
    // https://github.com/alexcrichton/proc-macro2/issues/159
    if #[cfg(all(feature = "nightly_derive", not(test)))] {
        fn compile_error(span: Span, msg: &'static str) {
            span.unstable()
                .error(msg)
                .emit();
        }
    } else {
        fn compile_error(_span: Span, msg: &str) {
            panic!("{}.  More information may be available when dynamock is built with the \"nightly\" feature.", msg);
        }
    }
}

fn do_forward(attrs: TokenStream, input: TokenStream) -> TokenStream {
    if let Some(tt) = attrs.into_iter().next() {
        compile_error(tt.span(), "#[forward] does not take any arguments");
    }
    let item: ItemTrait = match parse2(input.clone()) {
        Ok(t) => t,
        Err(e) => return e.to_compile_error()
    };
    let imp = forward_impl(&item);
    quote!(
        #input
        #imp
    )
}

/// Implement a trait for `Mock` by forwarding every method to `Mock::invoke`.
///
/// Every method must take `self` in some form.  Arguments are converted with
/// `serde::Serialize`, and return values with `serde::de::DeserializeOwned`.
/// Engine failures, such as a call that matches no expectation, panic.
///
/// A method returning `Result<T, E>` turns an error declared with
/// `Expectation::raises` into its `Err`, as long as the error is an `E`.  `E`
/// must implement `Clone`.
///
/// ```
/// # use dynamock::*;
/// #[derive(Clone, Debug, PartialEq)]
/// struct NotFound;
/// impl std::fmt::Display for NotFound {
///     fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
///         f.write_str("not found")
///     }
/// }
/// impl std::error::Error for NotFound {}
///
/// #[forward]
/// trait Store {
///     fn get(&self, key: &str) -> Result<u32, NotFound>;
///     fn put(&mut self, key: &str, value: u32);
/// }
///
/// let mut mock = Mock::new("Store");
/// mock.expects("put").with(args!["a", 1]);
/// mock.expects("get").with(args!["a"]).returns(1);
/// mock.expects("get").with(args!["b"]).raises(NotFound);
///
/// mock.put("a", 1);
/// assert_eq!(mock.get("a"), Ok(1));
/// assert_eq!(mock.get("b"), Err(NotFound));
/// mock.verify().unwrap();
/// ```
///
/// Generic traits, associated types, associated constants, and methods
/// without a receiver are not supported.
#[proc_macro_attribute]
pub fn forward(attrs: proc_macro::TokenStream, input: proc_macro::TokenStream)
    -> proc_macro::TokenStream
{
    do_forward(attrs.into(), input.into()).into()
}

fn forward_impl(item: &ItemTrait) -> TokenStream {
    if !item.generics.params.is_empty() {
        compile_error(item.generics.span(),
            "#[forward] does not support generic traits");
    }
    let ident = &item.ident;
    let unsafety = &item.unsafety;
    let methods = item.items.iter()
        .filter_map(|ti| match ti {
            TraitItem::Fn(f) => Some(forward_method(&f.sig)),
            TraitItem::Type(ty) => {
                compile_error(ty.span(),
                    "#[forward] does not support associated types");
                None
            },
            TraitItem::Const(c) => {
                compile_error(c.span(),
                    "#[forward] does not support associated constants");
                None
            },
            _ => None
        })
        .collect::<Vec<_>>();
    quote!(
        #unsafety impl #ident for ::dynamock::Mock {
            #(#methods)*
        }
    )
}

fn forward_method(sig: &Signature) -> TokenStream {
    if let Some(a) = &sig.asyncness {
        compile_error(a.span(), "#[forward] does not support async methods");
    }
    if sig.receiver().is_none() {
        compile_error(sig.ident.span(),
            "#[forward] methods must take self");
    }
    let mut sig = sig.clone();
    let names = name_args(&mut sig);
    let method = LitStr::new(&sig.ident.unraw().to_string(), sig.ident.span());
    let call = match &sig.output {
        ReturnType::Default => quote!(
            ::dynamock::__private::forward_unit(&self, #method, __dynamock_args)
        ),
        ReturnType::Type(_, ty) => match result_types(ty) {
            Some((t, e)) => quote!(
                ::dynamock::__private::forward_fallible::<#t, #e>(&self,
                    #method, __dynamock_args)
            ),
            None => quote!(
                ::dynamock::__private::forward(&self, #method, __dynamock_args)
            )
        }
    };
    quote!(
        #sig {
            let __dynamock_args = ::std::vec![
                #(::dynamock::__private::argument(#method, &#names)),*
            ];
            #call
        }
    )
}

/// Give every typed argument a plain identifier and strip any `mut` from
/// its binding.  Returns the identifiers in order.
fn name_args(sig: &mut Signature) -> Vec<Ident> {
    let mut names = Vec::new();
    for (i, fn_arg) in sig.inputs.iter_mut().enumerate() {
        if let FnArg::Typed(pat_type) = fn_arg {
            match pat_type.pat.as_mut() {
                Pat::Ident(pat_ident) if pat_ident.subpat.is_none() => {
                    pat_ident.mutability = None;
                    pat_ident.by_ref = None;
                    names.push(pat_ident.ident.clone());
                },
                pat => {
                    let ident = format_ident!("arg{}", i);
                    *pat = Pat::Ident(PatIdent {
                        attrs: Vec::new(),
                        by_ref: None,
                        mutability: None,
                        ident: ident.clone(),
                        subpat: None
                    });
                    names.push(ident);
                }
            }
        }
    }
    names
}

/// If `ty` looks like `Result<T, E>`, return `T` and `E`.
fn result_types(ty: &Type) -> Option<(&Type, &Type)> {
    let Type::Path(tp) = ty else {
        return None;
    };
    let seg = tp.path.segments.last()?;
    if seg.ident != "Result" {
        return None;
    }
    let PathArguments::AngleBracketed(abga) = &seg.arguments else {
        return None;
    };
    let mut types = abga.args.iter().filter_map(|ga| match ga {
        GenericArgument::Type(t) => Some(t),
        _ => None
    });
    match (types.next(), types.next(), types.next()) {
        (Some(t), Some(e), None) => Some((t, e)),
        _ => None
    }
}

#[cfg(test)]
mod t {
    use super::*;
    use std::str::FromStr;

    use pretty_assertions::assert_eq;

    fn cmp(attrs: &str, code: &str, expected: &str) {
        let attrs_ts = TokenStream::from_str(attrs).unwrap();
        let code_ts = TokenStream::from_str(code).unwrap();
        let output = do_forward(attrs_ts, code_ts);
        let output = output.to_string();
        // Round-trip expected through proc_macro2 so whitespace will be
        // identically formatted
        let expected = TokenStream::from_str(expected)
            .unwrap()
            .to_string();
        assert_eq!(output, expected);
    }

    #[test]
    #[should_panic(expected = "does not take any arguments")]
    fn arguments() {
        let code = r#"trait Foo {}"#;
        cmp("bar", code, "");
    }

    #[test]
    #[should_panic(expected = "does not support associated types")]
    fn associated_type() {
        let code = r#"
            trait Foo {
                type Item;
            }
        "#;
        cmp("", code, "");
    }

    #[test]
    #[should_panic(expected = "does not support generic traits")]
    fn generic_trait() {
        let code = r#"
            trait Foo<T> {
                fn foo(&self, t: T);
            }
        "#;
        cmp("", code, "");
    }

    #[test]
    fn fallible() {
        let code = r#"
            trait Foo {
                fn foo(&self, key: &str) -> Result<u32, MyError>;
            }
        "#;
        let expected = r#"
            trait Foo {
                fn foo(&self, key: &str) -> Result<u32, MyError>;
            }
            impl Foo for ::dynamock::Mock {
                fn foo(&self, key: &str) -> Result<u32, MyError> {
                    let __dynamock_args = ::std::vec![
                        ::dynamock::__private::argument("foo", &key)
                    ];
                    ::dynamock::__private::forward_fallible::<u32, MyError>(
                        &self, "foo", __dynamock_args)
                }
            }
        "#;
        cmp("", code, expected);
    }

    #[test]
    fn mutable_args() {
        let code = r#"
            trait Foo {
                fn foo(&mut self, mut x: u32, _: i16) -> u64;
            }
        "#;
        let expected = r#"
            trait Foo {
                fn foo(&mut self, mut x: u32, _: i16) -> u64;
            }
            impl Foo for ::dynamock::Mock {
                fn foo(&mut self, x: u32, arg2: i16) -> u64 {
                    let __dynamock_args = ::std::vec![
                        ::dynamock::__private::argument("foo", &x),
                        ::dynamock::__private::argument("foo", &arg2)
                    ];
                    ::dynamock::__private::forward(&self, "foo", __dynamock_args)
                }
            }
        "#;
        cmp("", code, expected);
    }

    #[test]
    #[should_panic(expected = "methods must take self")]
    fn no_receiver() {
        let code = r#"
            trait Foo {
                fn new() -> Self;
            }
        "#;
        cmp("", code, "");
    }

    #[test]
    fn not_a_trait() {
        let code = TokenStream::from_str(r#"struct Foo{}"#).unwrap();
        let output = do_forward(TokenStream::new(), code).to_string();
        assert!(output.contains("compile_error"));
        assert!(output.contains("expected `trait`"));
    }

    #[test]
    fn raw_identifier() {
        let code = r#"
            trait Foo {
                fn r#type(&self);
            }
        "#;
        let expected = r#"
            trait Foo {
                fn r#type(&self);
            }
            impl Foo for ::dynamock::Mock {
                fn r#type(&self) {
                    let __dynamock_args = ::std::vec![];
                    ::dynamock::__private::forward_unit(&self, "type",
                        __dynamock_args)
                }
            }
        "#;
        cmp("", code, expected);
    }

    #[test]
    fn unsafe_trait() {
        let code = r#"
            unsafe trait Foo {
                fn foo(&self);
            }
        "#;
        let expected = r#"
            unsafe trait Foo {
                fn foo(&self);
            }
            unsafe impl Foo for ::dynamock::Mock {
                fn foo(&self) {
                    let __dynamock_args = ::std::vec![];
                    ::dynamock::__private::forward_unit(&self, "foo",
                        __dynamock_args)
                }
            }
        "#;
        cmp("", code, expected);
    }

    #[test]
    fn result_types_need_two_arguments() {
        let ty: Type = parse_str("io::Result<u32>").unwrap();
        assert!(result_types(&ty).is_none());
        let ty: Type = parse_str("std::result::Result<u32, E>").unwrap();
        assert!(result_types(&ty).is_some());
    }
}
