//! # Naming
//!
//! Resource names are a pure function of the project, the environment and a
//! per-type suffix, so two environments of the same project never collide.
//!
//! Names are not validated here (length, allowed characters beyond hyphen
//! stripping); Azure Resource Manager rejects invalid names during apply.

use crate::constants::USERS_CONTAINER_NAME;

/// `{project}-{environment}-{suffix}`
#[must_use]
pub fn resource_name(project: &str, environment: &str, suffix: &str) -> String {
    format!("{project}-{environment}-{suffix}")
}

/// Name for resources that only accept alphanumeric characters (storage accounts).
///
/// Hyphens are removed from both identity inputs before concatenation.
#[must_use]
pub fn alphanumeric_name(project: &str, environment: &str, suffix: &str) -> String {
    format!(
        "{}{}{suffix}",
        strip_hyphens(project),
        strip_hyphens(environment)
    )
}

fn strip_hyphens(value: &str) -> String {
    value.chars().filter(|c| *c != '-').collect()
}

/// Every resource name of one deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    project: String,
    environment: String,
}

impl ResourceNames {
    pub fn new(project: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            environment: environment.into(),
        }
    }

    fn scoped(&self, suffix: &str) -> String {
        resource_name(&self.project, &self.environment, suffix)
    }

    #[must_use]
    pub fn resource_group(&self) -> String {
        self.scoped("rg")
    }

    #[must_use]
    pub fn storage_account(&self) -> String {
        alphanumeric_name(&self.project, &self.environment, "sa")
    }

    #[must_use]
    pub fn app_insights(&self) -> String {
        self.scoped("ai")
    }

    #[must_use]
    pub fn app_service_plan(&self) -> String {
        self.scoped("asp")
    }

    #[must_use]
    pub fn cosmos_account(&self) -> String {
        self.scoped("cdb")
    }

    #[must_use]
    pub fn database(&self) -> String {
        self.scoped("db")
    }

    /// Containers are scoped by their database, so the name is fixed
    #[must_use]
    pub fn users_container(&self) -> String {
        USERS_CONTAINER_NAME.to_string()
    }

    #[must_use]
    pub fn web_app(&self) -> String {
        self.scoped("web")
    }

    #[must_use]
    pub fn function_app(&self) -> String {
        self.scoped("func")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_for_shop_dev() {
        let names = ResourceNames::new("shop", "dev");
        assert_eq!(names.resource_group(), "shop-dev-rg");
        assert_eq!(names.storage_account(), "shopdevsa");
        assert_eq!(names.app_insights(), "shop-dev-ai");
        assert_eq!(names.app_service_plan(), "shop-dev-asp");
        assert_eq!(names.cosmos_account(), "shop-dev-cdb");
        assert_eq!(names.database(), "shop-dev-db");
        assert_eq!(names.users_container(), "users");
        assert_eq!(names.web_app(), "shop-dev-web");
        assert_eq!(names.function_app(), "shop-dev-func");
    }

    #[test]
    fn test_naming_is_idempotent() {
        let first = ResourceNames::new("shop", "prod");
        let second = ResourceNames::new("shop", "prod");
        assert_eq!(first, second);
        assert_eq!(first.web_app(), second.web_app());
        assert_eq!(first.storage_account(), second.storage_account());
    }

    #[test]
    fn test_environments_never_collide() {
        let dev = ResourceNames::new("shop", "dev");
        let prod = ResourceNames::new("shop", "prod");
        assert_ne!(dev.resource_group(), prod.resource_group());
        assert_ne!(dev.storage_account(), prod.storage_account());
        assert_ne!(dev.function_app(), prod.function_app());
    }

    #[test]
    fn test_storage_account_name_strips_every_hyphen() {
        let cases = vec![
            ("my-shop", "dev", "myshopdevsa"),
            ("my-big-shop", "dev", "mybigshopdevsa"),
            ("shop", "us-east", "shopuseastsa"),
            ("-shop-", "dev", "shopdevsa"),
        ];

        for (project, environment, expected) in cases {
            let name = ResourceNames::new(project, environment).storage_account();
            assert!(!name.contains('-'), "{name} should not contain hyphens");
            assert_eq!(name, expected);
        }
    }

    #[test]
    fn test_hyphenated_project_keeps_hyphens_in_other_names() {
        let names = ResourceNames::new("my-shop", "dev");
        assert_eq!(names.resource_group(), "my-shop-dev-rg");
        assert_eq!(names.web_app(), "my-shop-dev-web");
    }
}
