/// Defines an opaque, prefixed, nanoid-backed id type.
///
/// Mirrors the connector-service's `id_type!` family, trimmed to what this
/// demonstrator needs: a newtype over `String`, a `generate()` constructor,
/// and the `Display`/`Serialize`/`Deserialize` impls every wire DTO needs.
#[macro_export]
macro_rules! opaque_id {
    ($type:ident, $prefix:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Hash, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $type(String);

        impl $type {
            /// Generate a fresh, collision-resistant id with this type's prefix.
            pub fn generate() -> Self {
                Self($crate::fp_utils::generate_id_with_default_len($prefix))
            }

            /// Build from an already-known string (e.g. parsed off the wire).
            pub fn from_raw(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Debug for $type {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.debug_tuple(stringify!($type)).field(&self.0).finish()
            }
        }

        impl core::fmt::Display for $type {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}
