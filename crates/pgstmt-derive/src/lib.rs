//! Derive macros for pgstmt
//!
//! Provides the `#[derive(Record)]` macro.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod record;

/// Derive the `Record` trait for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use pgstmt::Record;
///
/// #[derive(Record)]
/// struct Person {
///     #[sql(pk)]
///     id: i64,
///     #[sql(column = "a_a")]
///     name: Option<String>,
///     #[sql(starts_with)]
///     city: Option<String>,
///     #[sql(skip)]
///     scratch: u64,
/// }
/// ```
///
/// # Attributes
///
/// - `#[sql(column = "name")]` - Bind the field to a different column name
/// - `#[sql(pk)]` - Mark the field as part of the primary key
/// - `#[sql(starts_with)]` / `#[sql(ends_with)]` / `#[sql(contains)]` -
///   Default match mode when the field lands in a predicate
/// - `#[sql(skip)]` - Leave the field out entirely
#[proc_macro_derive(Record, attributes(sql))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
