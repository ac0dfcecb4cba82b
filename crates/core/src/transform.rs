//! Field transformations used when building search records.
//!
//! These functions flatten nested entity fields into the shapes stored in the
//! search collections. They never fail: absent input yields an empty list or
//! `None`.

use crate::types::{Address, EmailAddress, Metafield, Profile};

/// Metafield values, in source order.
#[must_use]
pub fn metafields(fields: Option<&[Metafield]>) -> Vec<String> {
    fields
        .unwrap_or_default()
        .iter()
        .map(|field| field.value.clone())
        .collect()
}

/// Email address strings, in source order.
#[must_use]
pub fn emails(addresses: Option<&[EmailAddress]>) -> Vec<String> {
    addresses
        .unwrap_or_default()
        .iter()
        .map(|email| email.address.clone())
        .collect()
}

/// Parse a search profile from the default (first) address-book entry.
///
/// The full name is split on single spaces: the first token becomes the first
/// name and the second the last name. Further tokens are dropped, so
/// "Mary Ann Smith" indexes as `Mary` / `Ann`, and a single-token name gets an
/// empty last name.
///
/// Returns `None` when there is no address book, no first entry, or the first
/// entry has no full name.
#[must_use]
pub fn profile(address_book: Option<&[Address]>) -> Option<Profile> {
    let default_address = address_book?.first()?;
    let full_name = default_address
        .full_name
        .as_deref()
        .filter(|name| !name.is_empty())?;

    let mut names = full_name.split(' ');
    let first_name = names.next().unwrap_or_default().to_string();
    let last_name = names.next().unwrap_or_default().to_string();

    Some(Profile {
        first_name,
        last_name,
        phone: digits_only(default_address.phone.as_deref()),
    })
}

/// Strip every non-digit character. Absent input yields an empty string.
#[must_use]
pub fn digits_only(phone: Option<&str>) -> String {
    phone
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_digit)
        .collect()
}

/// The full name on an address, or an empty string.
#[must_use]
pub fn full_name(address: Option<&Address>) -> String {
    address
        .and_then(|a| a.full_name.clone())
        .unwrap_or_default()
}
