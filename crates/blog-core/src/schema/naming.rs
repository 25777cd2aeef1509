use serde::{Deserialize, Serialize};

/// Templates for the names of generated constraints and indexes.
///
/// Placeholders: `{table}`, `{column}`, `{constraint}`, `{referred_table}`.
/// Rendering is plain substitution, so the same inputs always give the same
/// name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingConvention {
    pub index: String,
    pub unique: String,
    pub check: String,
    pub foreign_key: String,
    pub primary_key: String,
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self {
            index: "ix_{column}".to_string(),
            unique: "uq_{table}_{column}".to_string(),
            check: "ck_{table}_{constraint}".to_string(),
            foreign_key: "fk_{table}_{column}_{referred_table}".to_string(),
            primary_key: "pk_{table}".to_string(),
        }
    }
}

impl NamingConvention {
    pub fn index_name(&self, table: &str, column: &str) -> String {
        render(&self.index, &[("table", table), ("column", column)])
    }

    pub fn unique_name(&self, table: &str, column: &str) -> String {
        render(&self.unique, &[("table", table), ("column", column)])
    }

    pub fn check_name(&self, table: &str, constraint: &str) -> String {
        render(&self.check, &[("table", table), ("constraint", constraint)])
    }

    pub fn foreign_key_name(&self, table: &str, column: &str, referred_table: &str) -> String {
        render(
            &self.foreign_key,
            &[
                ("table", table),
                ("column", column),
                ("referred_table", referred_table),
            ],
        )
    }

    pub fn primary_key_name(&self, table: &str) -> String {
        render(&self.primary_key, &[("table", table)])
    }
}

fn render(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |name, (key, value)| {
            name.replace(&format!("{{{key}}}"), value)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_templates() {
        let naming = NamingConvention::default();

        assert_eq!(naming.index_name("posts", "created"), "ix_created");
        assert_eq!(naming.unique_name("posts", "title"), "uq_posts_title");
        assert_eq!(naming.check_name("posts", "title_len"), "ck_posts_title_len");
        assert_eq!(
            naming.foreign_key_name("comments", "post_id", "posts"),
            "fk_comments_post_id_posts"
        );
        assert_eq!(naming.primary_key_name("posts"), "pk_posts");
    }

    #[test]
    fn test_names_are_deterministic() {
        let first = NamingConvention::default();
        let second = NamingConvention::default();

        assert_eq!(
            first.unique_name("posts", "body").as_bytes(),
            second.unique_name("posts", "body").as_bytes()
        );
        assert_eq!(first.primary_key_name("posts"), second.primary_key_name("posts"));
    }

    #[test]
    fn test_custom_template() {
        let naming = NamingConvention {
            index: "idx_{table}_{column}".to_string(),
            ..NamingConvention::default()
        };
        assert_eq!(naming.index_name("posts", "created"), "idx_posts_created");
    }
}
