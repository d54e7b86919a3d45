use bistro_core::money::{format_amount, Amount};
use serde::{Deserialize, Serialize};

/// A dish or drink that can be ordered. `unit_price` is never negative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "MenuItemData")]
pub struct MenuItem {
    pub name: String,
    pub description: String,
    pub unit_price: Amount,
}

impl MenuItem {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        unit_price: Amount,
    ) -> Result<Self, CatalogError> {
        let name = name.into();
        if unit_price < Amount::ZERO {
            return Err(CatalogError::NegativePrice {
                name,
                price: unit_price,
            });
        }

        Ok(Self {
            name,
            description: description.into(),
            unit_price,
        })
    }
}

#[derive(Deserialize)]
struct MenuItemData {
    name: String,
    description: String,
    unit_price: Amount,
}

impl TryFrom<MenuItemData> for MenuItem {
    type Error = CatalogError;

    fn try_from(data: MenuItemData) -> Result<Self, Self::Error> {
        MenuItem::new(data.name, data.description, data.unit_price)
    }
}

/// One node of the menu tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MenuEntry {
    Item(MenuItem),
    Category(MenuCategory),
}

impl MenuEntry {
    pub fn name(&self) -> &str {
        match self {
            MenuEntry::Item(item) => &item.name,
            MenuEntry::Category(category) => &category.name,
        }
    }

    pub fn price(&self) -> Amount {
        match self {
            MenuEntry::Item(item) => item.unit_price,
            MenuEntry::Category(category) => category.price(),
        }
    }

    fn render(&self, indent: usize, currency: &str) -> String {
        match self {
            MenuEntry::Item(item) => format!(
                "{}- {}: {} {} ({})",
                " ".repeat(indent),
                item.name,
                format_amount(item.unit_price),
                currency,
                item.description
            ),
            MenuEntry::Category(category) => category.render_at(indent, currency),
        }
    }
}

/// A named section of the menu, possibly nested
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MenuCategory {
    pub name: String,
    pub description: String,
    pub entries: Vec<MenuEntry>,
}

impl MenuCategory {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            entries: Vec::new(),
        }
    }

    pub fn add_item(&mut self, item: MenuItem) -> &mut Self {
        self.entries.push(MenuEntry::Item(item));
        self
    }

    pub fn add_category(&mut self, category: MenuCategory) -> &mut Self {
        self.entries.push(MenuEntry::Category(category));
        self
    }

    /// Remove the first direct child with the given name
    pub fn remove(&mut self, name: &str) -> Option<MenuEntry> {
        let index = self.entries.iter().position(|e| e.name() == name)?;
        Some(self.entries.remove(index))
    }

    pub fn child(&self, index: usize) -> Option<&MenuEntry> {
        self.entries.get(index)
    }

    /// Sum of every item price below this category
    pub fn price(&self) -> Amount {
        self.entries.iter().map(MenuEntry::price).sum()
    }

    /// Depth-first lookup of an item by exact name
    pub fn find_item(&self, name: &str) -> Option<&MenuItem> {
        self.entries.iter().find_map(|entry| match entry {
            MenuEntry::Item(item) if item.name == name => Some(item),
            MenuEntry::Item(_) => None,
            MenuEntry::Category(category) => category.find_item(name),
        })
    }

    /// All items in menu order
    pub fn items(&self) -> Vec<&MenuItem> {
        let mut items = Vec::new();
        for entry in &self.entries {
            match entry {
                MenuEntry::Item(item) => items.push(item),
                MenuEntry::Category(category) => items.extend(category.items()),
            }
        }
        items
    }

    /// Indented text rendering of the whole tree
    pub fn render(&self, currency: &str) -> String {
        self.render_at(0, currency)
    }

    fn render_at(&self, indent: usize, currency: &str) -> String {
        let mut out = format!("{}{}:", " ".repeat(indent), self.name);
        for entry in &self.entries {
            out.push('\n');
            out.push_str(&entry.render(indent + 2, currency));
        }
        out
    }
}

/// Priced lookup consumed by order handling
pub trait Catalog: Send + Sync {
    fn find(&self, name: &str) -> Result<MenuItem, CatalogError>;
}

impl Catalog for MenuCategory {
    fn find(&self, name: &str) -> Result<MenuItem, CatalogError> {
        self.find_item(name)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Menu item not found: {0}")]
    NotFound(String),

    #[error("Menu item {name} has a negative price: {price}")]
    NegativePrice { name: String, price: Amount },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn drinks() -> MenuCategory {
        let mut hot = MenuCategory::new("Горячие напитки", "");
        hot.add_item(MenuItem::new("Эспрессо", "Крепкий кофе", dec!(150)).unwrap())
            .add_item(MenuItem::new("Капучино", "Кофе с молочной пенкой", dec!(200)).unwrap());

        let mut drinks = MenuCategory::new("Напитки", "");
        drinks
            .add_category(hot)
            .add_item(MenuItem::new("Лимонад", "Домашний", dec!(200)).unwrap());
        drinks
    }

    #[test]
    fn test_find_searches_nested_categories() {
        let menu = drinks();

        let item = menu.find("Капучино").unwrap();
        assert_eq!(item.unit_price, dec!(200));

        let err = menu.find("Борщ").unwrap_err();
        assert_eq!(err, CatalogError::NotFound("Борщ".to_string()));
    }

    #[test]
    fn test_category_price_is_sum_of_children() {
        let menu = drinks();
        assert_eq!(menu.price(), dec!(550));
        assert_eq!(menu.items().len(), 3);
    }

    #[test]
    fn test_render_tree() {
        let menu = drinks();
        let expected = "Напитки:\n  Горячие напитки:\n    - Эспрессо: 150.00 лей (Крепкий кофе)\n    - Капучино: 200.00 лей (Кофе с молочной пенкой)\n  - Лимонад: 200.00 лей (Домашний)";
        assert_eq!(menu.render("лей"), expected);
    }

    #[test]
    fn test_remove_child() {
        let mut menu = drinks();
        let removed = menu.remove("Лимонад").unwrap();
        assert_eq!(removed.name(), "Лимонад");
        assert!(menu.find("Лимонад").is_err());
        assert!(menu.remove("Лимонад").is_none());
        assert_eq!(menu.child(0).map(MenuEntry::name), Some("Горячие напитки"));
    }

    #[test]
    fn test_negative_price_rejected() {
        let err = MenuItem::new("Скидка", "", dec!(-50)).unwrap_err();
        assert_eq!(
            err,
            CatalogError::NegativePrice {
                name: "Скидка".to_string(),
                price: dec!(-50),
            }
        );
        assert!(MenuItem::new("Вода из-под крана", "", dec!(0)).is_ok());

        let json = serde_json::json!({"name": "Скидка", "description": "", "unit_price": "-1.00"});
        assert!(serde_json::from_value::<MenuItem>(json).is_err());
    }

    #[test]
    fn test_entries_serialize_with_kind_tag() {
        let menu = drinks();
        let value = serde_json::to_value(&menu).unwrap();
        assert_eq!(value["entries"][0]["kind"], "CATEGORY");
        assert_eq!(value["entries"][1]["kind"], "ITEM");
    }
}
