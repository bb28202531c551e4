pub mod dev;
pub mod product;
pub mod qa;
pub mod radar;
pub mod tech;

pub use dev::DevAgent;
pub use product::ProductAgent;
pub use qa::QaAgent;
pub use radar::RadarAgent;
pub use tech::TechAgent;
