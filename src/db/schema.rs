//! Table naming and DDL generation

/// Column type given to every column
///
/// Values are loaded exactly as they appear in the file; numeric- or
/// date-looking columns are still text. Callers that need real types must
/// create the table themselves.
pub const COLUMN_TYPE: &str = "VARCHAR(255)";

/// Derive the table name from an object key: the text before the first '.'
///
/// Keys without a '.' are used whole. Different keys can map to the same name
/// (`sales.csv` and `sales.2024.csv`); the later load replaces the earlier table.
pub fn table_name_for_key(key: &str) -> &str {
    match key.find('.') {
        Some(pos) => &key[..pos],
        None => key,
    }
}

/// Quote an identifier with backticks, doubling any embedded backtick
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// The table a file is loaded into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    /// Column names in header order
    pub columns: Vec<String>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>, header: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns: header,
        }
    }

    /// Statements that make `database` exist and the session's default
    pub fn database_statements(database: &str) -> [String; 2] {
        let database = quote_ident(database);
        [
            format!("CREATE DATABASE IF NOT EXISTS {}", database),
            format!("USE {}", database),
        ]
    }

    /// Statements that discard any existing table of this name and create it empty
    pub fn replace_statements(&self) -> [String; 2] {
        [
            format!("DROP TABLE IF EXISTS {}", quote_ident(&self.name)),
            self.create_statement(),
        ]
    }

    /// Generate the CREATE TABLE statement
    pub fn create_statement(&self) -> String {
        let column_defs: Vec<String> = self
            .columns
            .iter()
            .map(|col| format!("{} {}", quote_ident(col), COLUMN_TYPE))
            .collect();

        format!(
            "CREATE TABLE {} ({})",
            quote_ident(&self.name),
            column_defs.join(", ")
        )
    }

    /// Generate the single-row INSERT statement, one positional parameter per column
    pub fn insert_statement(&self) -> String {
        let column_list: Vec<String> = self.columns.iter().map(|c| quote_ident(c)).collect();
        let placeholders = vec!["?"; self.columns.len()];

        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&self.name),
            column_list.join(", "),
            placeholders.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_table_name_for_key() {
        let test_cases = [
            // (key, expected, description)
            ("sales.csv", "sales", "simple extension"),
            ("archive.tar.gz", "archive", "stops at first dot"),
            ("sales.2024.csv", "sales", "dotted stem"),
            ("noextension", "noextension", "no dot"),
            ("reports/q1.csv", "reports/q1", "prefix kept"),
            (".hidden", "", "leading dot"),
            ("", "", "empty key"),
        ];

        for (key, expected, description) in test_cases {
            assert_eq!(
                table_name_for_key(key),
                expected,
                "Failed: {} - key '{}'",
                description,
                key
            );
        }
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("sales"), "`sales`");
        assert_eq!(quote_ident("first name"), "`first name`");
        assert_eq!(quote_ident("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_database_statements() {
        let [create, use_db] = TableDescriptor::database_statements("uploads");
        assert_eq!(create, "CREATE DATABASE IF NOT EXISTS `uploads`");
        assert_eq!(use_db, "USE `uploads`");
    }

    #[test]
    fn test_replace_statements() {
        let table = TableDescriptor::new("sales", header(&["id", "amount"]));
        let [drop, create] = table.replace_statements();

        assert_eq!(drop, "DROP TABLE IF EXISTS `sales`");
        assert_eq!(
            create,
            "CREATE TABLE `sales` (`id` VARCHAR(255), `amount` VARCHAR(255))"
        );
    }

    #[test]
    fn test_every_column_gets_text_type_in_header_order() {
        let table = TableDescriptor::new("t", header(&["price", "created_at", "price", "name"]));
        let ddl = table.create_statement();

        assert_eq!(ddl.matches(COLUMN_TYPE).count(), 4);
        let price = ddl.find("`price`").unwrap();
        let created = ddl.find("`created_at`").unwrap();
        let name = ddl.find("`name`").unwrap();
        assert!(price < created && created < name);
    }

    #[test]
    fn test_insert_statement() {
        let table = TableDescriptor::new("sales", header(&["id", "amount", "note"]));
        assert_eq!(
            table.insert_statement(),
            "INSERT INTO `sales` (`id`, `amount`, `note`) VALUES (?, ?, ?)"
        );
    }
}
