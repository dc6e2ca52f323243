//! Standard native units for Stratum.
//!
//! - **json** - `dumps` / `loads`
//! - **math** - constants and numeric functions
//! - **text** - string helpers
//!
//! # Usage
//!
//! Each unit is a [`NativeModule`] that can be installed into a
//! [`MemoryProvider`] under any name:
//!
//! ```
//! use stratum_registry::MemoryProvider;
//!
//! let provider = MemoryProvider::new();
//! stratum_modules::install(&provider).unwrap();
//! assert_eq!(provider.names().len(), 3);
//! ```

mod args;
pub mod json;
pub mod math;
pub mod text;

use stratum_core::PathError;
use stratum_registry::{MemoryProvider, NativeModule};

/// Every standard unit with its default name.
pub fn modules() -> Vec<(&'static str, NativeModule)> {
    vec![
        ("json", json::module()),
        ("math", math::module()),
        ("text", text::module()),
    ]
}

/// Install every standard unit into `provider` under its default name.
pub fn install(provider: &MemoryProvider) -> Result<(), PathError> {
    for (name, module) in modules() {
        provider.insert_native(name, module)?;
    }
    Ok(())
}
