use std::fmt;

use crate::{ConfigError, Result};

/// `project.dataset.table` reference used in place of bare table names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedTableRef {
    project_id: String,
    dataset: String,
    table: String,
}

impl QualifiedTableRef {
    pub fn new(
        project_id: impl Into<String>,
        dataset: impl Into<String>,
        table: impl Into<String>,
    ) -> Result<Self> {
        let reference = Self {
            project_id: project_id.into(),
            dataset: dataset.into(),
            table: table.into(),
        };

        for (component, value) in [
            ("project id", &reference.project_id),
            ("dataset", &reference.dataset),
            ("table", &reference.table),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyTableComponent { component }.into());
            }
        }

        Ok(reference)
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    #[must_use]
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// `` `project.dataset.table` ``
    #[must_use]
    pub fn qualified(&self) -> String {
        format!("`{}.{}.{}`", self.project_id, self.dataset, self.table)
    }

    /// `` `dataset.table` ``, resolved against the job's default project.
    #[must_use]
    pub fn dataset_qualified(&self) -> String {
        format!("`{}.{}`", self.dataset, self.table)
    }
}

impl fmt::Display for QualifiedTableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project_id, self.dataset, self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::QualifiedTableRef;
    use crate::{ConfigError, Error};

    #[test]
    fn renders_three_and_two_part_names() {
        let reference = QualifiedTableRef::new("p", "d", "t").expect("valid reference");
        assert_eq!(reference.qualified(), "`p.d.t`");
        assert_eq!(reference.dataset_qualified(), "`d.t`");
        assert_eq!(reference.to_string(), "p.d.t");
    }

    #[test]
    fn rejects_empty_components() {
        let error = QualifiedTableRef::new("p", " ", "t").expect_err("empty dataset");
        assert!(matches!(
            error,
            Error::Config(ConfigError::EmptyTableComponent {
                component: "dataset"
            })
        ));
    }
}
