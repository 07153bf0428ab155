//! Text vocabularies stored in `TEXT` columns guarded by CHECK constraints.
//!
//! Each enum variant maps to exactly one lowercase database literal. The
//! literal is what gets bound into queries and serialized over the API, so
//! `as_str` and `parse` must round-trip for every variant.

macro_rules! define_text_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $lit:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $lit)] $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            /// The database literal for this variant.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $lit ),+
                }
            }

            /// Parse a database literal. Returns `None` for unknown values.
            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $( $lit => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use define_text_enum;
