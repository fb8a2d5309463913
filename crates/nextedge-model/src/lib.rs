//! CloudFront edge event models for the nextedge handlers.
//!
//! Two event schemas are modelled:
//!
//! - [`origin`]: the Lambda@Edge origin-request event, whose headers are a
//!   map from lower-cased name to a list of `{key, value}` entries.
//! - [`function`]: the viewer-request event of CloudFront Functions, whose
//!   headers and cookies are `{value}` or `{multiValue: [...]}` objects.
//!
//! Both round-trip through `serde_json` with the platform's camelCase field
//! names. Fields the handlers do not interpret are kept verbatim so the
//! returned request carries everything CloudFront sent.

pub mod function;
pub mod origin;

pub use function::{FunctionEvent, FunctionRequest, FunctionValue, FunctionValueEntry, FunctionValues};
pub use origin::{CfBody, CfHeader, CfHeaders, CfOrigin, CfRequest, OriginRequestEvent};
