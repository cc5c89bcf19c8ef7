//! # Access Control
//!
//! Permission catalog and effective permission sets.
//!
//! A permission is either a model permission (an [`Action`] on a [`Resource`])
//! or one of the custom permissions. Its textual form is
//! `app_label.codename`, e.g. `warehouse.add_item` or
//! `companies.manage_company_features`.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Models that carry view/add/change/delete permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Resource {
    Company,
    Employee,
    Feature,
    CompanyFeature,
    User,
    Group,
    Item,
    ItemType,
    Manufacturer,
    ItemUnit,
}

impl Resource {
    pub const ALL: [Resource; 10] = [
        Resource::Company,
        Resource::Employee,
        Resource::Feature,
        Resource::CompanyFeature,
        Resource::User,
        Resource::Group,
        Resource::Item,
        Resource::ItemType,
        Resource::Manufacturer,
        Resource::ItemUnit,
    ];

    /// Application the model belongs to.
    pub fn app_label(&self) -> &'static str {
        match self {
            Resource::Company
            | Resource::Employee
            | Resource::Feature
            | Resource::CompanyFeature => "companies",
            Resource::User | Resource::Group => "auth",
            Resource::Item | Resource::ItemType | Resource::Manufacturer | Resource::ItemUnit => {
                "warehouse"
            }
        }
    }

    pub fn model_name(&self) -> &'static str {
        match self {
            Resource::Company => "company",
            Resource::Employee => "employee",
            Resource::Feature => "feature",
            Resource::CompanyFeature => "companyfeature",
            Resource::User => "user",
            Resource::Group => "group",
            Resource::Item => "item",
            Resource::ItemType => "itemtype",
            Resource::Manufacturer => "manufacturer",
            Resource::ItemUnit => "itemunit",
        }
    }

    /// Noun used in denial messages.
    pub fn display_plural(&self) -> &'static str {
        match self {
            Resource::Company => "the company",
            Resource::Employee => "employees",
            Resource::Feature => "features",
            Resource::CompanyFeature => "company features",
            Resource::User => "users",
            Resource::Group => "groups",
            Resource::Item => "items",
            Resource::ItemType => "item types",
            Resource::Manufacturer => "manufacturers",
            Resource::ItemUnit => "item units",
        }
    }

    fn from_parts(app_label: &str, model_name: &str) -> Option<Self> {
        Resource::ALL
            .into_iter()
            .find(|r| r.app_label() == app_label && r.model_name() == model_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    View,
    Add,
    Change,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::View, Action::Add, Action::Change, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Add => "add",
            Action::Change => "change",
            Action::Delete => "delete",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Action::ALL.into_iter().find(|a| a.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    Model(Resource, Action),
    /// `companies.manage_company_features`
    ManageCompanyFeatures,
    /// `warehouse.view_financial_dashboard`
    ViewFinancialDashboard,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown permission '{0}'")]
pub struct UnknownPermission(pub String);

impl Permission {
    pub const fn model(resource: Resource, action: Action) -> Self {
        Permission::Model(resource, action)
    }

    pub fn app_label(&self) -> &'static str {
        match self {
            Permission::Model(resource, _) => resource.app_label(),
            Permission::ManageCompanyFeatures => "companies",
            Permission::ViewFinancialDashboard => "warehouse",
        }
    }

    pub fn codename(&self) -> String {
        match self {
            Permission::Model(resource, action) => {
                format!("{}_{}", action.as_str(), resource.model_name())
            }
            Permission::ManageCompanyFeatures => "manage_company_features".to_string(),
            Permission::ViewFinancialDashboard => "view_financial_dashboard".to_string(),
        }
    }

    /// Every permission known to the system.
    pub fn all() -> Vec<Permission> {
        let mut all: Vec<Permission> = Resource::ALL
            .into_iter()
            .flat_map(|r| Action::ALL.into_iter().map(move |a| Permission::Model(r, a)))
            .collect();
        all.push(Permission::ManageCompanyFeatures);
        all.push(Permission::ViewFinancialDashboard);
        all
    }

    /// Every permission of the given application.
    pub fn for_app(app_label: &str) -> Vec<Permission> {
        Permission::all()
            .into_iter()
            .filter(|p| p.app_label() == app_label)
            .collect()
    }

    /// Message returned when a caller lacks this permission.
    pub fn denial_message(&self) -> String {
        let action = match self {
            Permission::Model(resource, action) => {
                format!("{} {}", action.as_str(), resource.display_plural())
            }
            Permission::ManageCompanyFeatures => "manage company features".to_string(),
            Permission::ViewFinancialDashboard => "view the financial dashboard".to_string(),
        };
        format!("You do not have permission to {action}.")
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app_label(), self.codename())
    }
}

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownPermission(s.to_string());
        let (app_label, codename) = s.split_once('.').ok_or_else(unknown)?;

        match (app_label, codename) {
            ("companies", "manage_company_features") => return Ok(Permission::ManageCompanyFeatures),
            ("warehouse", "view_financial_dashboard") => {
                return Ok(Permission::ViewFinancialDashboard);
            }
            _ => {}
        }

        let (action, model_name) = codename.split_once('_').ok_or_else(unknown)?;
        let action = Action::parse(action).ok_or_else(unknown)?;
        let resource = Resource::from_parts(app_label, model_name).ok_or_else(unknown)?;
        Ok(Permission::Model(resource, action))
    }
}

/// The effective permissions of one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    permissions: BTreeSet<Permission>,
}

impl PermissionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Active superusers implicitly hold every permission.
    pub fn superuser() -> Self {
        Self {
            permissions: Permission::all().into_iter().collect(),
        }
    }

    /// Build a set from stored `app_label.codename` strings, skipping unknown ones.
    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let permissions = codes
            .into_iter()
            .filter_map(|code| match code.as_ref().parse::<Permission>() {
                Ok(permission) => Some(permission),
                Err(err) => {
                    tracing::warn!(error = %err, "Ignoring stored permission");
                    None
                }
            })
            .collect();
        Self { permissions }
    }

    pub fn has(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    pub fn has_all(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.has(*p))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }

    /// Sorted textual forms.
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.permissions.iter().map(Permission::to_string).collect();
        codes.sort();
        codes
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        Self {
            permissions: iter.into_iter().collect(),
        }
    }
}

pub const COMPANY_ADMIN_GROUP: &str = "company_admin";
pub const WAREHOUSE_ASSISTANT_GROUP: &str = "warehouse_assistant";

const WAREHOUSE_MODELS: [Resource; 4] = [
    Resource::Item,
    Resource::ItemType,
    Resource::Manufacturer,
    Resource::ItemUnit,
];

fn warehouse(actions: &[Action]) -> Vec<Permission> {
    actions
        .iter()
        .flat_map(|a| WAREHOUSE_MODELS.iter().map(move |r| Permission::Model(*r, *a)))
        .collect()
}

/// Standard role groups and their exact permission sets, synchronised at startup.
pub fn standard_groups() -> Vec<(&'static str, Vec<Permission>)> {
    use Action::*;
    use Resource::*;

    let warehouse_viewer = warehouse(&[View]);
    let warehouse_editor = warehouse(&[View, Add, Change]);
    let mut warehouse_admin = warehouse_editor.clone();
    warehouse_admin.push(Permission::ViewFinancialDashboard);

    let company_viewer = vec![
        Permission::model(Company, View),
        Permission::model(Employee, View),
    ];
    let mut company_editor = company_viewer.clone();
    company_editor.extend([
        Permission::model(Company, Change),
        Permission::model(Employee, Change),
    ]);
    let mut company_admin = company_editor.clone();
    company_admin.extend([
        Permission::model(Employee, Add),
        Permission::model(User, View),
        Permission::model(User, Change),
        Permission::model(Group, View),
    ]);

    vec![
        ("warehouse_viewer", warehouse_viewer),
        ("warehouse_editor", warehouse_editor),
        ("warehouse_admin", warehouse_admin),
        ("company_viewer", company_viewer),
        ("company_editor", company_editor),
        (COMPANY_ADMIN_GROUP, company_admin),
    ]
}

/// Permissions of the `warehouse_assistant` group, applied only when the group is first created.
pub fn warehouse_assistant_permissions() -> Vec<Permission> {
    Permission::for_app("warehouse")
        .into_iter()
        .filter(|p| *p != Permission::ViewFinancialDashboard)
        .collect()
}

/// Direct permissions granted to the owner of a newly signed-up company.
pub fn company_owner_permissions() -> Vec<Permission> {
    let mut permissions = Permission::for_app("warehouse");
    permissions.push(Permission::ManageCompanyFeatures);
    permissions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textual_form_round_trips_for_catalog() {
        for permission in Permission::all() {
            let text = permission.to_string();
            assert_eq!(text.parse::<Permission>(), Ok(permission), "{text}");
        }
    }

    #[test]
    fn known_textual_forms() {
        assert_eq!(
            Permission::model(Resource::Item, Action::Add).to_string(),
            "warehouse.add_item"
        );
        assert_eq!(
            Permission::model(Resource::CompanyFeature, Action::Change).to_string(),
            "companies.change_companyfeature"
        );
        assert_eq!(
            Permission::ManageCompanyFeatures.to_string(),
            "companies.manage_company_features"
        );
        assert_eq!(
            "auth.view_group".parse::<Permission>(),
            Ok(Permission::model(Resource::Group, Action::View))
        );
    }

    #[test]
    fn denial_messages_name_the_action() {
        assert_eq!(
            Permission::model(Resource::Item, Action::View).denial_message(),
            "You do not have permission to view items."
        );
        assert_eq!(
            Permission::model(Resource::Company, Action::Change).denial_message(),
            "You do not have permission to change the company."
        );
    }

    #[test]
    fn rejects_unknown_or_misfiled_codes() {
        assert!("warehouse.view_company".parse::<Permission>().is_err());
        assert!("companies".parse::<Permission>().is_err());
        assert!("warehouse.fly_item".parse::<Permission>().is_err());
    }

    #[test]
    fn catalog_size() {
        assert_eq!(Permission::all().len(), 42);
        assert_eq!(Permission::for_app("warehouse").len(), 17);
    }

    #[test]
    fn from_codes_skips_unknown() {
        let set = PermissionSet::from_codes(["warehouse.view_item", "legacy.do_thing"]);
        assert_eq!(set.len(), 1);
        assert!(set.has(Permission::model(Resource::Item, Action::View)));
    }

    #[test]
    fn superuser_holds_everything() {
        let set = PermissionSet::superuser();
        assert!(set.has_all(&Permission::all()));
    }

    #[test]
    fn standard_groups_have_exact_sets() {
        let groups = standard_groups();
        let find = |name: &str| {
            groups
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, p)| p.clone())
                .unwrap()
        };

        assert_eq!(find("warehouse_viewer").len(), 4);
        assert_eq!(find("warehouse_editor").len(), 12);
        let admin = find("warehouse_admin");
        assert_eq!(admin.len(), 13);
        assert!(admin.contains(&Permission::ViewFinancialDashboard));

        let company_admin = find(COMPANY_ADMIN_GROUP);
        assert_eq!(company_admin.len(), 8);
        assert!(!company_admin.contains(&Permission::ManageCompanyFeatures));
        assert!(company_admin.contains(&Permission::model(Resource::User, Action::Change)));
    }

    #[test]
    fn assistant_and_owner_sets() {
        let assistant = warehouse_assistant_permissions();
        assert_eq!(assistant.len(), 16);
        assert!(!assistant.contains(&Permission::ViewFinancialDashboard));

        let owner = company_owner_permissions();
        assert_eq!(owner.len(), 18);
        assert!(owner.contains(&Permission::ManageCompanyFeatures));
        assert!(owner.contains(&Permission::ViewFinancialDashboard));
    }
}
