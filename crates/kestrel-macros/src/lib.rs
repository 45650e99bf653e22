// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! This crate provides procedural macros for Kestrel.
//!
//! Generated code refers to `::kestrel_core`, so crates using these derives
//! must depend on `kestrel-core`.

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Path, Token};

/// A derive macro that turns a struct into a custom event.
///
/// The event type code is assigned at runtime on first use through
/// `kestrel_core::event::custom_event_type`. If the struct has a named field
/// `timestamp: u64`, it is reported as the event timestamp; otherwise the
/// timestamp is `0`.
#[proc_macro_derive(Event)]
pub fn derive_event(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let has_timestamp = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => fields
                .named
                .iter()
                .any(|field| field.ident.as_ref().is_some_and(|ident| ident == "timestamp")),
            _ => false,
        },
        _ => false,
    };
    let timestamp = if has_timestamp {
        quote! { self.timestamp }
    } else {
        quote! { 0 }
    };

    let expanded = quote! {
        impl #impl_generics ::kestrel_core::event::Event for #name #ty_generics #where_clause {
            fn event_type(&self) -> ::kestrel_core::event::EventType {
                ::kestrel_core::event::custom_event_type::<Self>()
            }

            fn timestamp(&self) -> u64 {
                #timestamp
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }
        }
    };

    TokenStream::from(expanded)
}

/// A derive macro that implements `kestrel_core::event::BaseEventHandler`.
///
/// List the event types the handler accepts in a `#[handles(..)]` attribute;
/// the type must implement `EventHandler<E>` for each of them. Events of any
/// other type are ignored.
///
/// ```ignore
/// #[derive(EventHandler)]
/// #[handles(MouseButtonEvent, KeyboardEvent)]
/// struct Input { .. }
/// ```
#[proc_macro_derive(EventHandler, attributes(handles))]
pub fn derive_event_handler(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut handled: Vec<Path> = Vec::new();
    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("handles")) {
        match attr.parse_args_with(Punctuated::<Path, Token![,]>::parse_terminated) {
            Ok(paths) => handled.extend(paths),
            Err(err) => return err.to_compile_error().into(),
        }
    }

    if handled.is_empty() {
        return syn::Error::new(
            Span::call_site(),
            "#[derive(EventHandler)] needs a #[handles(EventType, ..)] attribute",
        )
        .to_compile_error()
        .into();
    }

    let arms = handled.iter().map(|event| {
        quote! {
            if let ::core::option::Option::Some(event) = event.downcast_ref::<#event>() {
                <Self as ::kestrel_core::event::EventHandler<#event>>::handle(self, event)?;
                return ::core::result::Result::Ok(true);
            }
        }
    });

    let expanded = quote! {
        impl #impl_generics ::kestrel_core::event::BaseEventHandler for #name #ty_generics #where_clause {
            fn accept(
                &mut self,
                event: &dyn ::core::any::Any,
            ) -> ::kestrel_core::anyhow::Result<bool> {
                #(#arms)*
                ::core::result::Result::Ok(false)
            }
        }
    };

    TokenStream::from(expanded)
}
