pub mod taxjar;

pub use taxjar::TaxJarProvider;
