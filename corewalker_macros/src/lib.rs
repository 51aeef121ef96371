//! Derive macros that generate the repetitive name/arity/help-string
//! boilerplate on iterator and visitor factories (see `spec.md` §4.5/§4.6).
//!
//! This plays the same role the sibling crate's `#[freeaccess]` attribute
//! macro played for the teacher project: instead of hand-writing the same
//! three trivial accessor methods on every one of the ten iterator
//! factories and seven visitor factories, the factory struct carries a
//! single helper attribute and the boilerplate is generated once, here.

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

mod meta;
use meta::{find_helper_attr, lit_int, lit_str};

/// `#[derive(IteratorMeta)]` with a `#[iterator(name = "...", args = N, help
/// = "...")]` attribute generates an `IteratorFactoryMeta` impl.
#[proc_macro_derive(IteratorMeta, attributes(iterator))]
pub fn derive_iterator_meta(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let ident = &input.ident;

    let nested = match find_helper_attr(&input.attrs, "iterator") {
        Ok(Some(nested)) => nested,
        Ok(None) => {
            return syn::Error::new(
                Span::call_site(),
                "expected #[iterator(name = \"...\", args = N, help = \"...\")]",
            )
            .to_compile_error()
            .into();
        }
        Err(err) => return err.to_compile_error().into(),
    };

    let name = match lit_str(&nested, "name") {
        Ok(v) => v,
        Err(err) => return err.to_compile_error().into(),
    };
    let args = match lit_int(&nested, "args") {
        Ok(v) => v,
        Err(err) => return err.to_compile_error().into(),
    };
    let help = lit_str(&nested, "help").unwrap_or_default();

    let expanded = quote! {
        impl crate::iterators::IteratorFactoryMeta for #ident {
            fn set_name(&self) -> &'static str {
                #name
            }

            fn arg_count(&self) -> usize {
                #args
            }

            fn help(&self) -> &'static str {
                #help
            }
        }
    };

    expanded.into()
}

/// `#[derive(VisitorMeta)]` with a `#[visitor(name = "...")]` attribute
/// generates a `VisitorFactoryMeta` impl.
#[proc_macro_derive(VisitorMeta, attributes(visitor))]
pub fn derive_visitor_meta(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let ident = &input.ident;

    let nested = match find_helper_attr(&input.attrs, "visitor") {
        Ok(Some(nested)) => nested,
        Ok(None) => {
            return syn::Error::new(Span::call_site(), "expected #[visitor(name = \"...\")]")
                .to_compile_error()
                .into();
        }
        Err(err) => return err.to_compile_error().into(),
    };

    let name = match lit_str(&nested, "name") {
        Ok(v) => v,
        Err(err) => return err.to_compile_error().into(),
    };

    let expanded = quote! {
        impl crate::visitors::VisitorFactoryMeta for #ident {
            fn command_name(&self) -> &'static str {
                #name
            }
        }
    };

    expanded.into()
}
