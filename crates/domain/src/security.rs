use std::collections::BTreeSet;
use std::str::FromStr;

use accessgate_core::AppError;
use serde::{Deserialize, Serialize};

/// Functional areas a tenant member can be granted access to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Customer, supplier and product registrations.
    Registrations,
    /// Sales orders and quotes.
    Sales,
    /// Receivables, payables and cash flow.
    Finance,
    /// Production orders and bills of materials.
    Production,
    /// Tenant settings and member management.
    Settings,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registrations => "registrations",
            Self::Sales => "sales",
            Self::Finance => "finance",
            Self::Production => "production",
            Self::Settings => "settings",
        }
    }

    /// Returns the label shown in permission pickers.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Registrations => "Registrations",
            Self::Sales => "Sales",
            Self::Finance => "Finance",
            Self::Production => "Production",
            Self::Settings => "Settings",
        }
    }

    /// Returns the one-line description shown under the label.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Registrations => "Manage customers, suppliers and products",
            Self::Sales => "Create and follow up sales orders",
            Self::Finance => "Access receivables, payables and cash flow",
            Self::Production => "Plan and track production orders",
            Self::Settings => "Change company settings and manage members",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::Registrations,
            Permission::Sales,
            Permission::Finance,
            Permission::Production,
            Permission::Settings,
        ];

        ALL
    }

    /// Returns picker descriptors for every permission, in declaration order.
    #[must_use]
    pub fn catalog() -> Vec<PermissionDescriptor> {
        Self::all()
            .iter()
            .map(|permission| PermissionDescriptor {
                value: *permission,
                label: permission.label(),
                description: permission.description(),
            })
            .collect()
    }

    /// Parses a transport value into a permission.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "registrations" => Ok(Self::Registrations),
            "sales" => Ok(Self::Sales),
            "finance" => Ok(Self::Finance),
            "production" => Ok(Self::Production),
            "settings" => Ok(Self::Settings),
            _ => Err(AppError::Validation(format!(
                "unknown permission value '{value}'"
            ))),
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Serializable picker entry for one permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PermissionDescriptor {
    /// Stable permission value.
    pub value: Permission,
    /// Human-readable label.
    pub label: &'static str,
    /// Human-readable description.
    pub description: &'static str,
}

/// Role of a user within one tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access to every functional area.
    Admin,
    /// Access limited to explicit permission grants.
    Restricted,
}

impl Role {
    /// Stored value that elevates a member to [`Role::Admin`].
    pub const ADMIN_STORAGE_VALUE: &'static str = "admin";

    /// Interprets a stored role value.
    ///
    /// Only the exact value `admin` elevates. Any other value, including
    /// unknown or differently cased strings, is [`Role::Restricted`].
    #[must_use]
    pub fn from_stored(value: &str) -> Self {
        if value == Self::ADMIN_STORAGE_VALUE {
            Self::Admin
        } else {
            Self::Restricted
        }
    }

    /// Returns a stable value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => Self::ADMIN_STORAGE_VALUE,
            Self::Restricted => "restricted",
        }
    }

    /// Returns whether the role grants every permission.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Explicit grants resolved for one `(user, tenant)` pair.
///
/// Grant values outside [`Permission`] are kept as opaque tokens so callers
/// can inspect them, but they never satisfy a permission check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PermissionSet {
    recognized: BTreeSet<Permission>,
    unrecognized: BTreeSet<String>,
}

impl PermissionSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set holding every known permission.
    #[must_use]
    pub fn full() -> Self {
        Permission::all().iter().copied().collect()
    }

    /// Builds a set from raw stored grant values.
    pub fn from_grant_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for value in values {
            set.insert_value(value.as_ref());
        }
        set
    }

    /// Adds one raw grant value.
    pub fn insert_value(&mut self, value: &str) {
        match Permission::from_str(value) {
            Ok(permission) => {
                self.recognized.insert(permission);
            }
            Err(_) => {
                self.unrecognized.insert(value.to_owned());
            }
        }
    }

    /// Adds one permission.
    pub fn insert(&mut self, permission: Permission) {
        self.recognized.insert(permission);
    }

    /// Returns whether the permission is granted.
    #[must_use]
    pub fn contains(&self, permission: Permission) -> bool {
        self.recognized.contains(&permission)
    }

    /// Iterates over recognized permissions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.recognized.iter().copied()
    }

    /// Returns grant values that did not match a known permission.
    #[must_use]
    pub fn unrecognized(&self) -> &BTreeSet<String> {
        &self.unrecognized
    }

    /// Number of recognized permissions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.recognized.len()
    }

    /// Returns whether no recognized permission is granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recognized.is_empty()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        Self {
            recognized: iter.into_iter().collect(),
            unrecognized: BTreeSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{Permission, PermissionSet, Role};

    #[test]
    fn permission_roundtrip_storage_value() {
        let permission = Permission::Production;
        let restored = Permission::from_str(permission.as_str());
        assert!(matches!(restored, Ok(value) if value == permission));
    }

    #[test]
    fn unknown_permission_is_rejected() {
        assert!(Permission::from_str("inventory").is_err());
        assert!(Permission::from_str("Sales").is_err());
    }

    #[test]
    fn catalog_lists_every_permission_once() {
        let catalog = Permission::catalog();
        assert_eq!(catalog.len(), Permission::all().len());
        assert_eq!(catalog[2].value, Permission::Finance);
        assert_eq!(catalog[2].label, "Finance");
    }

    #[test]
    fn only_exact_admin_value_elevates() {
        assert_eq!(Role::from_stored("admin"), Role::Admin);
        assert_eq!(Role::from_stored("usuario"), Role::Restricted);
        assert_eq!(Role::from_stored("Admin"), Role::Restricted);
        assert_eq!(Role::from_stored(" admin"), Role::Restricted);
        assert_eq!(Role::from_stored("superuser"), Role::Restricted);
        assert_eq!(Role::from_stored(""), Role::Restricted);
    }

    #[test]
    fn grant_values_keep_unknown_tokens_apart() {
        let set = PermissionSet::from_grant_values(["finance", "finance", "inventory", "settings"]);

        assert_eq!(set.len(), 2);
        assert!(set.contains(Permission::Finance));
        assert!(set.contains(Permission::Settings));
        assert!(!set.contains(Permission::Sales));
        assert!(set.unrecognized().contains("inventory"));
    }

    #[test]
    fn full_set_matches_enumeration() {
        let full = PermissionSet::full();
        assert!(Permission::all().iter().all(|permission| full.contains(*permission)));
    }
}
