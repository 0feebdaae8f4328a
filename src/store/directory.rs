//! Reference data owned outside the core: department and staff names.
//!
//! Used only to decorate report rows.

use crate::model::TenantId;
use std::collections::HashMap;

/// Tenant-scoped name lookups.
pub trait Directory: Send + Sync {
    /// Display name of a department.
    fn department_name(&self, tenant: &TenantId, department_id: &str) -> Option<String>;

    /// Display name of a staff member.
    fn staff_name(&self, tenant: &TenantId, staff_id: &str) -> Option<String>;
}

/// Fixed in-memory directory.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    departments: HashMap<(TenantId, String), String>,
    staff: HashMap<(TenantId, String), String>,
}

impl StaticDirectory {
    /// Empty directory; every lookup misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a department name.
    pub fn with_department(mut self, tenant: &TenantId, id: &str, name: &str) -> Self {
        self.departments
            .insert((tenant.clone(), id.to_string()), name.to_string());
        self
    }

    /// Register a staff member name.
    pub fn with_staff(mut self, tenant: &TenantId, id: &str, name: &str) -> Self {
        self.staff
            .insert((tenant.clone(), id.to_string()), name.to_string());
        self
    }
}

impl Directory for StaticDirectory {
    fn department_name(&self, tenant: &TenantId, department_id: &str) -> Option<String> {
        self.departments
            .get(&(tenant.clone(), department_id.to_string()))
            .cloned()
    }

    fn staff_name(&self, tenant: &TenantId, staff_id: &str) -> Option<String> {
        self.staff
            .get(&(tenant.clone(), staff_id.to_string()))
            .cloned()
    }
}
