// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

//! Declarative macros for reducing boilerplate.
//!
//! - [`simple_display!`] — `Display` impl mapping enum variants to string literals
//! - [`define_id!`] — a fixed-prefix, inline-buffer id newtype
//! - [`builder!`] — test builder struct with Default, setters, and `build()`

/// Generate a `Display` impl that maps enum variants to string literals.
///
/// Unit variants match directly; data-carrying variants use `(..)` to ignore fields.
#[macro_export]
macro_rules! simple_display {
    ($enum:ty { $( $variant:ident $(( $($ignore:tt)* ))? => $str:expr ),+ $(,)? }) => {
        impl std::fmt::Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(match self {
                    $( Self::$variant $(( $($ignore)* ))? => $str, )+
                })
            }
        }
    };
}

/// Define a newtype id wrapper around [`crate::id::IdBuf`] with a fixed prefix.
///
/// The id format is `{prefix}{nanoid}`, where `prefix` is supplied at the
/// call site and `nanoid` is a random alphanumeric suffix sized so the
/// whole id fits in [`crate::id::ID_MAX_LEN`] bytes.
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* $vis:vis struct $name:ident($prefix:expr)) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        $vis struct $name($crate::id::IdBuf);

        impl $name {
            /// Type prefix embedded in every generated id.
            pub const PREFIX: &'static str = $prefix;

            /// Generate a new random id with this type's prefix.
            pub fn new() -> Self {
                let suffix_len = $crate::id::ID_MAX_LEN - $prefix.len();
                let suffix = nanoid::nanoid!(suffix_len, &$crate::id::ALPHABET);
                Self($crate::id::IdBuf::new(&format!("{}{}", $prefix, suffix)))
            }

            /// Parse an existing id string without regenerating it.
            pub fn from_string(s: impl AsRef<str>) -> Self {
                Self($crate::id::IdBuf::new(s.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0.as_str())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.0.as_str())
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                self.0.as_str()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::from_string(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::from_string(s)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Ok(Self::from_string(s))
            }
        }
    };
}

/// Generate a test builder (struct + Default + setters + build).
///
/// All generated items are gated behind `#[cfg(any(test, feature = "test-support"))]`.
///
/// Field groups:
/// - `into { field: Type = default }` — setter uses `impl Into<Type>`
/// - `set { field: Type = default }` — setter takes `Type` directly
/// - `option { field: Type = default }` — builder field is `Option<Type>`,
///   setter wraps in `Some(v.into())`
/// - `computed { field: Type = expr }` — no builder field or setter;
///   value computed at build time
#[macro_export]
macro_rules! builder {
    (
        pub struct $builder:ident => $target:ident {
            $($rest:tt)*
        }
    ) => {
        $crate::builder_munch! {
            @step $builder, $target, {}, {}, {}, {}, $($rest)*
        }
    };
}

/// Internal tt-muncher backing [`builder!`]. Consumes `into { .. }` /
/// `set { .. }` / `option { .. }` / `computed { .. }` blocks one at a
/// time, in any order and any number of times, accumulating their
/// fields into four token buckets before emitting the builder.
#[macro_export]
#[doc(hidden)]
macro_rules! builder_munch {
    (@step $builder:ident, $target:ident,
        {$($into:tt)*}, {$($set:tt)*}, {$($option:tt)*}, {$($computed:tt)*},
        into { $( $f:ident : $t:ty = $d:expr ),* $(,)? } $($rest:tt)*
    ) => {
        $crate::builder_munch! {
            @step $builder, $target,
            {$($into)* $( $f : $t = $d, )*}, {$($set)*}, {$($option)*}, {$($computed)*},
            $($rest)*
        }
    };
    (@step $builder:ident, $target:ident,
        {$($into:tt)*}, {$($set:tt)*}, {$($option:tt)*}, {$($computed:tt)*},
        set { $( $f:ident : $t:ty = $d:expr ),* $(,)? } $($rest:tt)*
    ) => {
        $crate::builder_munch! {
            @step $builder, $target,
            {$($into)*}, {$($set)* $( $f : $t = $d, )*}, {$($option)*}, {$($computed)*},
            $($rest)*
        }
    };
    (@step $builder:ident, $target:ident,
        {$($into:tt)*}, {$($set:tt)*}, {$($option:tt)*}, {$($computed:tt)*},
        option { $( $f:ident : $t:ty = $d:expr ),* $(,)? } $($rest:tt)*
    ) => {
        $crate::builder_munch! {
            @step $builder, $target,
            {$($into)*}, {$($set)*}, {$($option)* $( $f : $t = $d, )*}, {$($computed)*},
            $($rest)*
        }
    };
    (@step $builder:ident, $target:ident,
        {$($into:tt)*}, {$($set:tt)*}, {$($option:tt)*}, {$($computed:tt)*},
        computed { $( $f:ident : $t:ty = $d:expr ),* $(,)? } $($rest:tt)*
    ) => {
        $crate::builder_munch! {
            @step $builder, $target,
            {$($into)*}, {$($set)*}, {$($option)*}, {$($computed)* $( $f : $t = $d, )*},
            $($rest)*
        }
    };
    (@step $builder:ident, $target:ident,
        {$( $into_field:ident : $into_ty:ty = $into_default:expr ),* $(,)?},
        {$( $set_field:ident : $set_ty:ty = $set_default:expr ),* $(,)?},
        {$( $opt_field:ident : $opt_ty:ty = $opt_default:expr ),* $(,)?},
        {$( $comp_field:ident : $comp_ty:ty = $comp_expr:expr ),* $(,)?},
    ) => {
        #[cfg(any(test, feature = "test-support"))]
        pub struct $builder {
            $( $into_field: $into_ty, )*
            $( $set_field: $set_ty, )*
            $( $opt_field: Option<$opt_ty>, )*
        }

        #[cfg(any(test, feature = "test-support"))]
        impl Default for $builder {
            fn default() -> Self {
                Self {
                    $( $into_field: $into_default.into(), )*
                    $( $set_field: $set_default, )*
                    $( $opt_field: $opt_default, )*
                }
            }
        }

        #[cfg(any(test, feature = "test-support"))]
        impl $builder {
            $(
                pub fn $into_field(mut self, v: impl Into<$into_ty>) -> Self {
                    self.$into_field = v.into();
                    self
                }
            )*

            $(
                pub fn $set_field(mut self, v: $set_ty) -> Self {
                    self.$set_field = v;
                    self
                }
            )*

            $(
                pub fn $opt_field(mut self, v: impl Into<$opt_ty>) -> Self {
                    self.$opt_field = Some(v.into());
                    self
                }
            )*

            pub fn build(self) -> $target {
                $target {
                    $( $into_field: self.$into_field, )*
                    $( $set_field: self.$set_field, )*
                    $( $opt_field: self.$opt_field, )*
                    $( $comp_field: $comp_expr, )*
                }
            }
        }

        #[cfg(any(test, feature = "test-support"))]
        impl $target {
            /// Create a builder with test defaults.
            pub fn builder() -> $builder {
                $builder::default()
            }
        }
    };
}
