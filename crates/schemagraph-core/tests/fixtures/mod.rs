//! Test fixtures for schema pipeline tests
//!
//! Schemas here are built the way an introspection collaborator would hand
//! them over: relations by name, back-reference lists empty.

#![allow(dead_code)]

use schemagraph_core::{Column, ColumnDefault, Driver, Relation, Schema, Table};

/// Snapshot written by a previous run, matching [`test_schema`]
pub const TEST_SCHEMA_JSON: &str = include_str!("testschema.json");

/// Two tables `a` and `b` with a single relation `a.a -> b.b`
pub fn test_schema() -> Schema {
    Schema::new("testschema")
        .with_tables(vec![
            Table::new("a").with_comment("table a").with_columns(vec![
                Column::new("a", "bigint(20)").with_comment("column a"),
                Column::new("a2", "datetime")
                    .with_comment("column a2")
                    .with_default(ColumnDefault::Value("CURRENT_TIMESTAMP".to_string())),
            ]),
            Table::new("b").with_comment("table b").with_columns(vec![
                Column::new("b", "text").with_nullable(true).with_comment("column b"),
                Column::new("b2", "text").with_nullable(true).with_comment("column b2"),
            ]),
        ])
        .with_relations(vec![
            Relation::new("a", ["a"], "b", ["b"]).with_def("FOREIGN KEY (a) REFERENCES b (b)"),
        ])
        .with_driver(Driver::new("testdriver", "1.0.0"))
}

/// `users` and `posts` without any relation between them
pub fn users_and_posts() -> Schema {
    Schema::new("testschema").with_tables(vec![
        Table::new("users").with_comment("users comment").with_columns(vec![
            Column::new("id", "serial"),
            Column::new("username", "text"),
        ]),
        Table::new("posts").with_comment("posts comment").with_columns(vec![
            Column::new("id", "serial"),
            Column::new("user_id", "int"),
            Column::new("title", "text"),
        ]),
    ])
}

/// A small blog schema with a composite key and a self reference
pub fn blog_schema() -> Schema {
    Schema::new("blog")
        .with_tables(vec![
            Table::new("users").with_columns(vec![
                Column::new("id", "int"),
                Column::new("email", "varchar(255)"),
            ]),
            Table::new("posts").with_columns(vec![
                Column::new("id", "int"),
                Column::new("user_id", "int"),
                Column::new("title", "text"),
            ]),
            Table::new("comments").with_columns(vec![
                Column::new("id", "int"),
                Column::new("post_id", "int"),
                Column::new("user_id", "int"),
                Column::new("parent_comment_id", "int").with_nullable(true),
            ]),
            Table::new("post_tags").with_columns(vec![
                Column::new("post_id", "int"),
                Column::new("tag", "varchar(64)"),
            ]),
            Table::new("tag_usage").with_columns(vec![
                Column::new("post_id", "int"),
                Column::new("tag", "varchar(64)"),
                Column::new("count", "int"),
            ]),
        ])
        .with_relations(vec![
            Relation::new("posts", ["user_id"], "users", ["id"]),
            Relation::new("comments", ["post_id"], "posts", ["id"]),
            Relation::new("comments", ["user_id"], "users", ["id"]),
            Relation::new("comments", ["parent_comment_id"], "comments", ["id"]),
            Relation::new("post_tags", ["post_id"], "posts", ["id"]),
            Relation::new("tag_usage", ["post_id", "tag"], "post_tags", ["post_id", "tag"]),
        ])
}
