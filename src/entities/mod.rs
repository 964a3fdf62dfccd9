//! sea-orm entities, one module per table.

pub mod category;
pub mod customer;
pub mod dining_table;
pub mod ingredient;
pub mod menu_item;
pub mod order;
pub mod order_line;
pub mod recipe_line;
pub mod reservation;
pub mod stock_transaction;
