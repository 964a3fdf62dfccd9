use std::sync::Arc;

use crate::db::DbPool;
use crate::events::EventSender;

pub mod catalog;
pub mod customers;
pub mod inventory;
pub mod orders;
pub mod reservations;

/// All domain services, constructed once at startup and shared via
/// `AppState`.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<catalog::CatalogService>,
    pub inventory: Arc<inventory::InventoryService>,
    pub customers: Arc<customers::CustomerService>,
    pub orders: Arc<orders::OrderService>,
    pub reservations: Arc<reservations::ReservationService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, events: EventSender) -> Self {
        let inventory = Arc::new(inventory::InventoryService::new(
            db.clone(),
            events.clone(),
        ));
        let customers = Arc::new(customers::CustomerService::new(
            db.clone(),
            events.clone(),
        ));
        Self {
            catalog: Arc::new(catalog::CatalogService::new(db.clone())),
            orders: Arc::new(orders::OrderService::new(
                db.clone(),
                events.clone(),
                inventory.clone(),
                customers.clone(),
            )),
            reservations: Arc::new(reservations::ReservationService::new(db.clone(), events)),
            inventory,
            customers,
        }
    }
}
