mod env;
pub use env::EnvCredentialProvider;

mod static_provider;
pub use static_provider::StaticCredentialProvider;

mod config;
pub use config::ConfigCredentialProvider;

mod default;
pub use default::DefaultCredentialProvider;
