pub mod menu;
pub mod seed;

pub use menu::{Catalog, CatalogError, MenuCategory, MenuEntry, MenuItem};
pub use seed::restaurant_menu;
