/// Configuration macros for zero-repetition config definitions
///
/// `config_struct!` declares a configuration struct with its defaults in a
/// single place and generates:
/// - A struct with public fields
/// - A `Default` implementation with the specified values
/// - Serde support with `#[serde(default)]`, so partial TOML files load
///
/// # Example
/// ```
/// bullion_fetcher::config_struct! {
///     pub struct PacingConfig {
///         delay_ms: u64 = 4000,
///         enabled: bool = true,
///     }
/// }
///
/// let pacing = PacingConfig::default();
/// assert_eq!(pacing.delay_ms, 4000);
/// ```
#[macro_export]
macro_rules! config_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_name:ident: $field_type:ty = $default_value:expr
            ),*
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field_name: $field_type,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $(
                        $field_name: $default_value,
                    )*
                }
            }
        }
    };
}
