//! Snapshot diff engine for comparing an expected schema against an actual one
//!
//! Both sides are matched by name: tables by table name, columns by column
//! name within a table, relations by their endpoints. The expected side is
//! typically a committed snapshot and the actual side a fresh analysis.

use schemagraph_core::{
    Column, Diagnostic, DiagnosticCode, Location, Relation, Report, Schema, Severity, Table,
};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// Result of comparing an expected schema against an actual schema
#[derive(Debug, Clone)]
pub struct SnapshotDiff {
    /// Name of the expected schema
    pub expected_name: String,

    /// Name of the actual schema
    pub actual_name: String,

    /// Number of tables examined across both sides
    pub tables_compared: usize,

    /// Number of relations examined across both sides
    pub relations_compared: usize,

    /// Diagnostics produced by the comparison
    pub diagnostics: Vec<Diagnostic>,
}

impl SnapshotDiff {
    /// Compare two schemas
    ///
    /// Diagnostics come out in a fixed order: table and column changes
    /// following the expected table order, then tables only present in the
    /// actual schema, then relation changes.
    pub fn compare(expected: &Schema, actual: &Schema) -> Self {
        let mut diagnostics = Vec::new();
        let mut seen_tables = HashSet::new();

        for expected_table in &expected.tables {
            seen_tables.insert(expected_table.name.as_str());

            match actual.find_table_by_name(&expected_table.name) {
                Ok(actual_table) => {
                    compare_tables(expected_table, actual_table, &mut diagnostics);
                }
                Err(_) => {
                    let impact = dependent_tables(expected, expected_table);
                    let mut message = format!(
                        "Table '{}' was dropped ({} columns)",
                        expected_table.name,
                        expected_table.columns.len()
                    );
                    if !impact.is_empty() {
                        message.push_str(&format!("; referenced by {}", impact.join(", ")));
                    }

                    diagnostics.push(
                        Diagnostic::new(DiagnosticCode::SchemaTableDropped, Severity::Error, message)
                            .with_location(Location::table(&expected_table.name))
                            .with_expected(expected_table.name.clone())
                            .with_impact(impact),
                    );
                }
            }
        }

        let mut union = seen_tables.len();
        for actual_table in &actual.tables {
            if seen_tables.contains(actual_table.name.as_str()) {
                continue;
            }
            union += 1;

            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::SchemaTableAdded,
                    Severity::Info,
                    format!(
                        "New table '{}' ({} columns)",
                        actual_table.name,
                        actual_table.columns.len()
                    ),
                )
                .with_location(Location::table(&actual_table.name))
                .with_actual(actual_table.name.clone()),
            );
        }

        let relations_compared = compare_relations(expected, actual, &mut diagnostics);

        debug!(
            expected = %expected.name,
            actual = %actual.name,
            diagnostics = diagnostics.len(),
            "compared schemas"
        );

        Self {
            expected_name: expected.name.clone(),
            actual_name: actual.name.clone(),
            tables_compared: union,
            relations_compared,
            diagnostics,
        }
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Warn)
    }

    /// Check if the schemas are equivalent
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Count error diagnostics
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Count warning diagnostics
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warn)
    }

    /// Count info diagnostics
    pub fn info_count(&self) -> usize {
        self.count(Severity::Info)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == severity).count()
    }

    /// Fold the diagnostics into a report
    pub fn into_report(self) -> Report {
        let tables = self.tables_compared;
        let relations = self.relations_compared;
        Report::from_diagnostics(self.diagnostics).with_coverage(tables, relations)
    }
}

fn compare_tables(expected: &Table, actual: &Table, diagnostics: &mut Vec<Diagnostic>) {
    if expected.comment != actual.comment {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::SchemaCommentChanged,
                Severity::Info,
                format!("Table '{}' comment changed", expected.name),
            )
            .with_location(Location::table(&expected.name))
            .with_comparison(&expected.comment, &actual.comment),
        );
    }

    let mut seen_columns = HashSet::new();

    for expected_col in &expected.columns {
        seen_columns.insert(expected_col.name.as_str());

        match actual.find_column_by_name(&expected_col.name) {
            Ok(actual_col) => compare_columns(&expected.name, expected_col, actual_col, diagnostics),
            Err(_) => {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::SchemaColumnDropped,
                        Severity::Error,
                        format!(
                            "Column '{}.{}' was dropped (expected type: {})",
                            expected.name, expected_col.name, expected_col.column_type
                        ),
                    )
                    .with_location(Location::column(&expected.name, &expected_col.name))
                    .with_expected(expected_col.column_type.clone()),
                );
            }
        }
    }

    for actual_col in &actual.columns {
        if seen_columns.contains(actual_col.name.as_str()) {
            continue;
        }

        diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::SchemaColumnAdded,
                Severity::Info,
                format!(
                    "New column '{}.{}' (type: {})",
                    actual.name, actual_col.name, actual_col.column_type
                ),
            )
            .with_location(Location::column(&actual.name, &actual_col.name))
            .with_actual(actual_col.column_type.clone()),
        );
    }
}

fn compare_columns(table: &str, expected: &Column, actual: &Column, diagnostics: &mut Vec<Diagnostic>) {
    let location = Location::column(table, &expected.name);

    // Types are compared verbatim
    if expected.column_type != actual.column_type {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::SchemaColumnTypeChanged,
                Severity::Error,
                format!(
                    "Column '{}' type changed: was {}, now {}",
                    location, expected.column_type, actual.column_type
                ),
            )
            .with_location(location.clone())
            .with_comparison(&expected.column_type, &actual.column_type),
        );
    }

    if expected.nullable != actual.nullable {
        let (was, now, severity) = if actual.nullable {
            ("NOT NULL", "NULL", Severity::Warn)
        } else {
            ("NULL", "NOT NULL", Severity::Error)
        };

        diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::SchemaColumnNullabilityChanged,
                severity,
                format!("Column '{}' nullability changed: was {}, now {}", location, was, now),
            )
            .with_location(location.clone())
            .with_comparison(was, now),
        );
    }

    if expected.comment != actual.comment {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::SchemaCommentChanged,
                Severity::Info,
                format!("Column '{}' comment changed", location),
            )
            .with_location(location)
            .with_comparison(&expected.comment, &actual.comment),
        );
    }
}

/// Endpoints identifying a relation; `def` and the additional flag are ignored
type RelationKey<'a> = (&'a str, &'a [String], &'a str, &'a [String]);

fn relation_key(relation: &Relation) -> RelationKey<'_> {
    (
        relation.table.as_str(),
        relation.columns.as_slice(),
        relation.parent_table.as_str(),
        relation.parent_columns.as_slice(),
    )
}

/// Compare relations as multisets and return how many distinct relations were examined
///
/// Each expected relation claims the first unclaimed actual relation with the
/// same endpoints, so duplicated relations are counted one by one.
fn compare_relations(expected: &Schema, actual: &Schema, diagnostics: &mut Vec<Diagnostic>) -> usize {
    let mut unclaimed: HashMap<RelationKey<'_>, Vec<usize>> = HashMap::new();
    for (position, relation) in actual.relations.iter().enumerate().rev() {
        unclaimed.entry(relation_key(relation)).or_default().push(position);
    }

    let mut claimed = vec![false; actual.relations.len()];
    for relation in &expected.relations {
        match unclaimed.get_mut(&relation_key(relation)).and_then(Vec::pop) {
            Some(position) => claimed[position] = true,
            None => diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::SchemaRelationDropped,
                    Severity::Warn,
                    format!("Relation {} was dropped", relation),
                )
                .with_location(Location::table(&relation.table))
                .with_expected(relation.to_string()),
            ),
        }
    }

    let mut added = 0;
    for (relation, _) in actual.relations.iter().zip(&claimed).filter(|(_, claimed)| !**claimed) {
        added += 1;
        diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::SchemaRelationAdded,
                Severity::Info,
                format!("New relation {}", relation),
            )
            .with_location(Location::table(&relation.table))
            .with_actual(relation.to_string()),
        );
    }

    expected.relations.len() + added
}

/// Tables holding relations that point at `table`, from its columns' back-references
fn dependent_tables(schema: &Schema, table: &Table) -> Vec<String> {
    let dependents: BTreeSet<&str> = table
        .columns
        .iter()
        .flat_map(|column| schema.child_relations_of(column))
        .map(|relation| relation.table.as_str())
        .filter(|name| *name != table.name)
        .collect();

    dependents.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn users_and_posts() -> Schema {
        let mut schema = Schema::new("blog")
            .with_tables(vec![
                Table::new("users").with_columns(vec![
                    Column::new("id", "integer"),
                    Column::new("email", "text"),
                ]),
                Table::new("posts").with_columns(vec![
                    Column::new("id", "integer"),
                    Column::new("user_id", "integer"),
                    Column::new("title", "text").with_nullable(true),
                ]),
            ])
            .with_relations(vec![Relation::new("posts", ["user_id"], "users", ["id"])]);
        schema.repair().unwrap();
        schema
    }

    fn codes(diff: &SnapshotDiff) -> Vec<DiagnosticCode> {
        diff.diagnostics.iter().map(|d| d.code).collect()
    }

    #[test]
    fn test_no_changes() {
        let expected = users_and_posts();
        let diff = SnapshotDiff::compare(&expected, &expected.clone());

        assert!(diff.is_empty());
        assert!(!diff.has_errors());
        assert_eq!(diff.tables_compared, 2);
        assert_eq!(diff.relations_compared, 1);
    }

    #[test]
    fn test_dropped_table_lists_dependents() {
        let expected = users_and_posts();
        let mut actual = expected.clone();
        actual.tables.retain(|t| t.name != "users");
        actual.relations.clear();

        let diff = SnapshotDiff::compare(&expected, &actual);

        assert_eq!(
            codes(&diff),
            vec![DiagnosticCode::SchemaTableDropped, DiagnosticCode::SchemaRelationDropped]
        );
        assert_eq!(diff.diagnostics[0].impact, vec!["posts"]);
        assert_eq!(diff.diagnostics[0].expected.as_deref(), Some("users"));
        assert_eq!(diff.diagnostics[0].actual, None);
        assert_eq!(
            diff.diagnostics[1].expected.as_deref(),
            Some("posts(user_id) -> users(id)")
        );
        assert!(diff.diagnostics[0].message.contains("referenced by posts"));
        assert_eq!(diff.error_count(), 1);
        assert_eq!(diff.warning_count(), 1);
    }

    #[test]
    fn test_added_table() {
        let expected = users_and_posts();
        let mut actual = expected.clone();
        actual.tables.push(Table::new("tags").with_columns(vec![Column::new("id", "integer")]));

        let diff = SnapshotDiff::compare(&expected, &actual);

        assert_eq!(codes(&diff), vec![DiagnosticCode::SchemaTableAdded]);
        assert_eq!(diff.info_count(), 1);
        assert_eq!(diff.tables_compared, 3);
        assert_eq!(diff.diagnostics[0].expected, None);
        assert_eq!(diff.diagnostics[0].actual.as_deref(), Some("tags"));
    }

    #[test]
    fn test_column_changes() {
        let expected = users_and_posts();
        let mut actual = expected.clone();
        {
            let posts = actual.find_table_by_name_mut("posts").unwrap();
            posts.columns.retain(|c| c.name != "title");
            posts.columns.push(Column::new("body", "text"));
            posts.find_column_by_name_mut("id").unwrap().column_type = "bigint".to_string();
        }

        let diff = SnapshotDiff::compare(&expected, &actual);

        assert_eq!(
            codes(&diff),
            vec![
                DiagnosticCode::SchemaColumnTypeChanged,
                DiagnosticCode::SchemaColumnDropped,
                DiagnosticCode::SchemaColumnAdded,
            ]
        );
        assert_eq!(diff.diagnostics[0].expected.as_deref(), Some("integer"));
        assert_eq!(diff.diagnostics[0].actual.as_deref(), Some("bigint"));
        assert_eq!(
            diff.diagnostics[1].location,
            Some(Location::column("posts", "title"))
        );
        assert_eq!(diff.diagnostics[1].expected.as_deref(), Some("text"));
        assert_eq!(diff.diagnostics[2].actual.as_deref(), Some("text"));
        assert_eq!(diff.diagnostics[2].expected, None);
        assert_eq!(diff.error_count(), 2);
    }

    #[test]
    fn test_nullability_severity() {
        let expected = users_and_posts();
        let mut actual = expected.clone();
        {
            let posts = actual.find_table_by_name_mut("posts").unwrap();
            // NOT NULL -> NULL loosens the column
            posts.find_column_by_name_mut("user_id").unwrap().nullable = true;
            // NULL -> NOT NULL may break inserts
            posts.find_column_by_name_mut("title").unwrap().nullable = false;
        }

        let diff = SnapshotDiff::compare(&expected, &actual);

        assert_eq!(diff.diagnostics.len(), 2);
        assert_eq!(diff.diagnostics[0].severity, Severity::Warn);
        assert_eq!(diff.diagnostics[1].severity, Severity::Error);
        assert!(diff.diagnostics[1].message.contains("was NULL, now NOT NULL"));
    }

    #[test]
    fn test_comment_changes() {
        let expected = users_and_posts();
        let mut actual = expected.clone();
        actual.find_table_by_name_mut("users").unwrap().comment = "accounts".to_string();
        actual
            .find_table_by_name_mut("users")
            .unwrap()
            .find_column_by_name_mut("email")
            .unwrap()
            .comment = "login".to_string();

        let diff = SnapshotDiff::compare(&expected, &actual);

        assert_eq!(diff.info_count(), 2);
        assert!(diff
            .diagnostics
            .iter()
            .all(|d| d.code == DiagnosticCode::SchemaCommentChanged));
    }

    #[test]
    fn test_relation_definition_is_ignored() {
        let expected = users_and_posts();
        let mut actual = expected.clone();
        actual.relations[0].def = "FOREIGN KEY (user_id) REFERENCES users(id)".to_string();
        actual.relations[0].is_additional = true;

        assert!(SnapshotDiff::compare(&expected, &actual).is_empty());
    }

    #[test]
    fn test_duplicate_relations_counted() {
        let expected = users_and_posts();
        let mut actual = expected.clone();
        actual
            .relations
            .push(Relation::new("posts", ["user_id"], "users", ["id"]));
        actual.repair().unwrap();

        let diff = SnapshotDiff::compare(&expected, &actual);

        assert_eq!(codes(&diff), vec![DiagnosticCode::SchemaRelationAdded]);
        assert_eq!(diff.diagnostics[0].actual.as_deref(), Some("posts(user_id) -> users(id)"));
        assert_eq!(diff.relations_compared, 2);
    }

    #[test]
    fn test_into_report() {
        let expected = users_and_posts();
        let mut actual = expected.clone();
        actual.tables.retain(|t| t.name != "posts");
        actual.relations.clear();

        let report = SnapshotDiff::compare(&expected, &actual).into_report();

        assert!(report.has_errors());
        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.errors, 1);
        assert_eq!(report.summary.warnings, 1);
        assert_eq!(report.summary.tables_compared, 2);
        assert_eq!(report.summary.relations_compared, 1);
    }
}
