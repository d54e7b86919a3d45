use rust_decimal::Decimal;

use crate::menu::{MenuCategory, MenuItem};

fn item(name: &str, description: &str, price: u32) -> MenuItem {
    MenuItem {
        name: name.to_string(),
        description: description.to_string(),
        unit_price: Decimal::from(price),
    }
}

/// The house menu served by default
pub fn restaurant_menu() -> MenuCategory {
    let mut appetizers = MenuCategory::new("Закуски", "Легкие блюда для начала трапезы");
    appetizers
        .add_item(item("Цезарь с курицей", "Салат с куриным филе, сыром пармезан и соусом цезарь", 350))
        .add_item(item("Брускетта с томатами", "Хрустящий багет с томатами и базиликом", 250))
        .add_item(item("Карпаччо из говядины", "Тонко нарезанная говядина с рукколой и пармезаном", 450));

    let mut main_courses = MenuCategory::new("Основные блюда", "Сытные блюда для основной части трапезы");
    main_courses
        .add_item(item("Стейк Рибай", "Стейк из мраморной говядины с гарниром", 1200))
        .add_item(item("Паста Карбонара", "Паста с беконом, яйцом и сыром пармезан", 550))
        .add_item(item("Филе лосося", "Запеченное филе лосося с овощами", 850));

    let mut desserts = MenuCategory::new("Десерты", "Сладкие блюда для завершения трапезы");
    desserts
        .add_item(item("Тирамису", "Классический итальянский десерт с маскарпоне", 350))
        .add_item(item("Чизкейк", "Нежный десерт на основе сливочного сыра", 300))
        .add_item(item("Фруктовый салат", "Ассорти из свежих фруктов", 250));

    let mut hot_drinks = MenuCategory::new("Горячие напитки", "Согревающие напитки");
    hot_drinks
        .add_item(item("Эспрессо", "Крепкий итальянский кофе", 150))
        .add_item(item("Капучино", "Кофе с молочной пенкой", 200))
        .add_item(item("Чай", "Черный или зеленый на выбор", 150));

    let mut cold_drinks = MenuCategory::new("Холодные напитки", "Освежающие напитки");
    cold_drinks
        .add_item(item("Лимонад", "Домашний лимонад с мятой", 200))
        .add_item(item("Молочный коктейль", "Ванильный, шоколадный или клубничный", 250))
        .add_item(item("Минеральная вода", "Газированная или негазированная", 100));

    let mut drinks = MenuCategory::new("Напитки", "Освежающие и согревающие напитки");
    drinks.add_category(hot_drinks).add_category(cold_drinks);

    let mut menu = MenuCategory::new("Меню ресторана", "");
    menu.add_category(appetizers)
        .add_category(main_courses)
        .add_category(desserts)
        .add_category(drinks);
    menu
}
