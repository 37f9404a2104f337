// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stable string identifiers: address names and namespecs.

/// Define a newtype identifier wrapper around `String`.
///
/// Generates `new()`, `as_str()`, `Display`, `From<String>`, `From<&str>`,
/// `PartialEq<str>`, `PartialEq<&str>`, and `Borrow<str>` implementations,
/// so the wrapper can be used directly as a `HashMap` key without an
/// allocation at every lookup.
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

crate::define_id! {
    /// Stable name of one peer node, as it appears in `address_list`.
    pub struct AddressName;
}

crate::define_id! {
    /// Canonical `application:process` identifier.
    pub struct Namespec;
}

impl Namespec {
    /// Build a namespec from its two parts.
    pub fn from_parts(application_name: &str, process_name: &str) -> Self {
        Self(format!("{application_name}:{process_name}"))
    }

    /// Split back into `(application_name, process_name)`.
    ///
    /// A namespec built via [`Namespec::from_parts`] always carries a `:`
    /// separator, but one deserialized off the wire (a peer RPC request)
    /// carries no such guarantee. A colonless value is treated as
    /// `(whole, "")` rather than panicking the node (spec §7: malformed
    /// input is surfaced, never crashes the sequencer).
    pub fn split(&self) -> (&str, &str) {
        self.0.split_once(':').unwrap_or((self.0.as_str(), ""))
    }

    pub fn application_name(&self) -> &str {
        self.split().0
    }

    pub fn process_name(&self) -> &str {
        self.split().1
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
