use std::sync::Arc;

use bistro_catalog::{restaurant_menu, MenuCategory};
use bistro_order::{Notifier, OrderService, OrderStore, PaymentLedger, StaffNotifier};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod app_config;

pub use app_config::Config;

/// A fully wired restaurant: its menu and the order service over it
pub struct Restaurant {
    pub name: String,
    pub currency_label: String,
    pub menu: Arc<MenuCategory>,
    pub service: OrderService,
}

impl Restaurant {
    pub fn menu_text(&self) -> String {
        self.menu.render(&self.currency_label)
    }
}

/// Wire catalog, store, notifier and ledger from configuration.
/// `base` is the terminal deliverer every staff pipeline ends in.
pub fn build_restaurant(config: &Config, base: Arc<dyn Notifier>) -> Restaurant {
    let menu = Arc::new(restaurant_menu());
    let store = OrderStore::new(menu.clone());
    let notifier = StaffNotifier::new(
        base,
        Arc::new(config.staff.roster()),
        &config.notifications.settings(),
    );
    let service = OrderService::new(
        store,
        notifier,
        PaymentLedger::new(),
        config.notifications.event_buffer,
    );

    Restaurant {
        name: config.restaurant.name.clone(),
        currency_label: config.restaurant.currency_label.clone(),
        menu,
        service,
    }
}

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bistro=info,bistro_app=info,bistro_order=info,bistro_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
