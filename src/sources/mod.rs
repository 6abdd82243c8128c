//! Package sources.
//!
//! Everything xcfuse learns about a package comes from here: the package
//! manager that describes and resolves it, the description cache, and the
//! dependency checkouts listed in `Package.resolved`.

pub mod checkout;
pub mod manifest_loader;
pub mod package_manager;
pub mod resolved;

pub use checkout::{Checkout, CheckoutError};
pub use manifest_loader::ManifestLoader;
pub use package_manager::{PackageManager, SwiftPackageManager};
pub use resolved::{Pin, ResolvedState};
