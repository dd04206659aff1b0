pub mod config;
pub mod directive;
pub mod policy;
pub mod settings;
pub mod source;

pub use config::{CspConfig, CspConfigBuilder};
pub use directive::Directive;
pub use policy::{CspPolicy, CspPolicyBuilder, PolicySegment};
pub use settings::CspSettings;
pub use source::Source;
