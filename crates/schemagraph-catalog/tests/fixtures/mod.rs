//! Test fixtures for data source integration tests
//!
//! Raw schemas the way a source hands them over before repair: relations
//! name their tables and columns, back-references are empty.

#![allow(dead_code)]

use schemagraph_core::{Column, ColumnDefault, Driver, Relation, Schema, Table};

/// A small shop schema
///
/// - customers
/// - orders referencing customers
/// - order_items referencing orders and products
/// - products
pub fn shop_schema() -> Schema {
    Schema::new("shop")
        .with_tables(vec![
            Table::new("orders")
                .with_comment("placed orders")
                .with_columns(vec![
                    Column::new("id", "bigint"),
                    Column::new("customer_id", "bigint"),
                    Column::new("placed_at", "timestamp")
                        .with_default(ColumnDefault::Value("now()".to_string())),
                ]),
            Table::new("customers").with_columns(vec![
                Column::new("id", "bigint"),
                Column::new("email", "text"),
                Column::new("nickname", "text").with_nullable(true),
            ]),
            Table::new("order_items").with_columns(vec![
                Column::new("order_id", "bigint"),
                Column::new("product_id", "bigint"),
                Column::new("quantity", "integer"),
            ]),
            Table::new("products").with_columns(vec![
                Column::new("id", "bigint"),
                Column::new("name", "text"),
            ]),
        ])
        .with_relations(vec![
            Relation::new("orders", ["customer_id"], "customers", ["id"])
                .with_def("FOREIGN KEY (customer_id) REFERENCES customers(id)"),
            Relation::new("order_items", ["order_id"], "orders", ["id"])
                .with_def("FOREIGN KEY (order_id) REFERENCES orders(id)"),
            Relation::new("order_items", ["product_id"], "products", ["id"])
                .with_def("FOREIGN KEY (product_id) REFERENCES products(id)"),
        ])
        .with_driver(Driver::new("postgres", "16.2"))
}

/// Shop schema with a relation pointing at a table that does not exist
pub fn broken_shop_schema() -> Schema {
    let mut schema = shop_schema();
    schema
        .relations
        .push(Relation::new("order_items", ["order_id"], "invoices", ["id"]));
    schema
}
