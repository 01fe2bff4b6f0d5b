use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

/// Derive a component with the default (no-op) lifecycle. Types that need `begin`, `update` or
/// `destroyed` implement the trait by hand instead.
pub fn derive_component(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    let struct_name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    // `::flappy_engine` resolves inside the engine crate through `extern crate self as
    // flappy_engine;` in lib.rs.
    TokenStream::from(quote! {
        impl #impl_generics ::flappy_engine::ecs::Component for #struct_name #ty_generics #where_clause {
        }
    })
}
