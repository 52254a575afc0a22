mod registrar;
pub use registrar::Registrar;
