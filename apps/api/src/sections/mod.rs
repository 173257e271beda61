pub mod manager;
pub mod shapes;

pub use manager::SectionManager;
