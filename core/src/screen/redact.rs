//! Privacy redaction
//!
//! Scrubs personally identifying substrings from serialized screen text
//! before it leaves the device. The pattern list is fixed and ordered:
//! the email pattern runs first so a phone-like digit run inside an
//! address is consumed as part of the address, not matched on its own.
//! Replacement markers contain nothing the patterns can re-match, which
//! makes the transform idempotent.

use lazy_static::lazy_static;
use regex::Regex;

pub const EMAIL_MARKER: &str = "[EMAIL_HIDDEN]";
pub const PHONE_MARKER: &str = "[PHONE_HIDDEN]";

lazy_static! {
    static ref EMAIL: Regex =
        Regex::new(r"[A-Za-z0-9._-]+@[A-Za-z0-9-]+\.[A-Za-z]{2,}").expect("valid regex");
    static ref PHONE: Regex =
        Regex::new(r"\b\d{3}[-. ]?\d{3}[-. ]?\d{4}\b").expect("valid regex");
}

/// Replace email-shaped and phone-shaped substrings with fixed markers.
pub fn redact(input: &str) -> String {
    let pass = EMAIL.replace_all(input, EMAIL_MARKER);
    PHONE.replace_all(&pass, PHONE_MARKER).into_owned()
}
