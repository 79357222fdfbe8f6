//! Seeds written as plain SQL files
//!
//! A `.sql` seed holds an up section and an optional down section:
//!
//! ```sql
//! -- up
//! INSERT INTO roles (name) VALUES ('admin');
//!
//! -- down
//! DELETE FROM roles WHERE name = 'admin';
//! ```
//!
//! Statements before the first marker belong to `up`, so a file without
//! markers is entirely `up`.

use async_trait::async_trait;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use std::fs;
use std::path::Path;

use crate::error::GardenerResult;
use crate::seed::{Seed, SeedContext};

/// A seed loaded from a `.sql` file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlSeed {
    up: Vec<String>,
    down: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Up,
    Down,
}

impl SqlSeed {
    pub fn load(path: &Path) -> GardenerResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        let (up_sql, down_sql) = split_sections(content);
        Self {
            up: split_sql_statements(&up_sql),
            down: split_sql_statements(&down_sql),
        }
    }

    pub fn up_statements(&self) -> &[String] {
        &self.up
    }

    pub fn down_statements(&self) -> &[String] {
        &self.down
    }
}

#[async_trait]
impl Seed for SqlSeed {
    async fn up(&self, ctx: &mut SeedContext) -> GardenerResult<()> {
        for statement in &self.up {
            ctx.statement(statement).await?;
        }
        Ok(())
    }

    async fn down(&self, ctx: &mut SeedContext) -> GardenerResult<()> {
        for statement in &self.down {
            ctx.statement(statement).await?;
        }
        Ok(())
    }
}

fn section_marker(line: &str) -> Option<Section> {
    let trimmed = line.trim().to_lowercase();
    let comment = trimmed.strip_prefix("--")?;

    match comment.trim() {
        "up" | "+up" | "up seed" => Some(Section::Up),
        "down" | "+down" | "down seed" => Some(Section::Down),
        _ => None,
    }
}

/// Split file content into its up and down SQL
fn split_sections(content: &str) -> (String, String) {
    let mut current = Section::Up;

    let mut up_sql = Vec::new();
    let mut down_sql = Vec::new();

    for line in content.lines() {
        if let Some(section) = section_marker(line) {
            current = section;
            continue;
        }

        // Skip comment lines and empty lines
        if line.trim().is_empty() || line.trim().starts_with("--") {
            continue;
        }

        match current {
            Section::Up => up_sql.push(line),
            Section::Down => down_sql.push(line),
        }
    }

    (
        up_sql.join("\n").trim().to_string(),
        down_sql.join("\n").trim().to_string(),
    )
}

/// Split SQL into statements, falling back to `;` splitting when parsing fails
pub fn split_sql_statements(sql: &str) -> Vec<String> {
    if sql.trim().is_empty() {
        return Vec::new();
    }

    let dialect = GenericDialect {};
    match Parser::parse_sql(&dialect, sql) {
        Ok(parsed) => parsed.iter().map(|stmt| stmt.to_string()).collect(),
        Err(e) => {
            tracing::warn!("SQL parsing failed, using naive semicolon splitting: {}", e);
            sql.split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections() {
        let seed = SqlSeed::parse(
            "-- Seed: roles\n\
             -- up\n\
             INSERT INTO roles (name) VALUES ('admin');\n\
             INSERT INTO roles (name) VALUES ('editor');\n\
             \n\
             -- down\n\
             DELETE FROM roles;\n",
        );

        assert_eq!(seed.up_statements().len(), 2);
        assert!(seed.up_statements()[0].contains("'admin'"));
        assert!(seed.up_statements()[1].contains("'editor'"));
        assert_eq!(seed.down_statements(), &["DELETE FROM roles".to_string()]);
    }

    #[test]
    fn test_without_markers_everything_is_up() {
        let seed = SqlSeed::parse("INSERT INTO t (a) VALUES (1);\nINSERT INTO t (a) VALUES (2);");
        assert_eq!(seed.up_statements().len(), 2);
        assert!(seed.down_statements().is_empty());
    }

    #[test]
    fn test_up_only_file_has_no_down() {
        let seed = SqlSeed::parse("-- up\nINSERT INTO t (a) VALUES (1);\n");
        assert_eq!(seed.up_statements().len(), 1);
        assert!(seed.down_statements().is_empty());
    }

    #[test]
    fn test_statements_before_down_marker_are_up() {
        let seed = SqlSeed::parse(
            "INSERT INTO t (a) VALUES (1);\n\
             INSERT INTO t (a) VALUES (2);\n\
             -- down\n\
             DELETE FROM t;\n",
        );
        assert_eq!(seed.up_statements().len(), 2);
        assert_eq!(seed.down_statements(), &["DELETE FROM t".to_string()]);
    }

    #[test]
    fn test_unparseable_sql_falls_back_to_semicolons() {
        let statements = split_sql_statements("FROBNICATE things; FROBNICATE more;");
        assert_eq!(statements, vec!["FROBNICATE things", "FROBNICATE more"]);
    }

    #[test]
    fn test_empty_sql() {
        assert!(split_sql_statements("  \n ").is_empty());
    }
}
