pub mod category;
pub mod mock;
pub mod product;

pub use category::CategoryService;
pub use product::ProductService;
