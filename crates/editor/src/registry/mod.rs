//! Component catalogue: which MDX components map onto which editor blocks.

/// Built-in catalogue.
pub mod defaults;
/// Rule and lookup types.
pub mod types;

pub use defaults::{CALLOUT_TYPES, catalogue, default_catalogue};
pub use types::{
    AttrDefault, AttrRejection, AttrType, AttributeRule, Catalogue, ChildPolicy, ComponentRule,
    StrayPolicy,
};
