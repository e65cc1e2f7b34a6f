//! Database models for customers, departments and the links between them and applications.

use crate::db::errors::Result;
use crate::db::validation;
use crate::types::{ApplicationId, CustomerDepartmentId, CustomerId, DepartmentApplicationId, DepartmentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Database request for creating a customer
#[derive(Debug, Clone)]
pub struct CustomerCreateDBRequest {
    pub customer_name: String,
}

impl CustomerCreateDBRequest {
    pub fn validate(&self) -> Result<()> {
        validation::required("customer_name", &self.customer_name, 100)
    }
}

/// Database request for renaming a customer
#[derive(Debug, Clone, Default)]
pub struct CustomerUpdateDBRequest {
    pub customer_name: Option<String>,
}

impl CustomerUpdateDBRequest {
    pub fn validate(&self) -> Result<()> {
        match &self.customer_name {
            Some(name) => validation::required("customer_name", name, 100),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CustomerDBResponse {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub created_at: DateTime<Utc>,
}

/// Database request for creating a department
#[derive(Debug, Clone)]
pub struct DepartmentCreateDBRequest {
    pub department_name: String,
}

impl DepartmentCreateDBRequest {
    pub fn validate(&self) -> Result<()> {
        validation::required("department_name", &self.department_name, 100)
    }
}

/// Database request for renaming a department
#[derive(Debug, Clone, Default)]
pub struct DepartmentUpdateDBRequest {
    pub department_name: Option<String>,
}

impl DepartmentUpdateDBRequest {
    pub fn validate(&self) -> Result<()> {
        match &self.department_name {
            Some(name) => validation::required("department_name", name, 100),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DepartmentDBResponse {
    pub department_id: DepartmentId,
    pub department_name: String,
    pub created_at: DateTime<Utc>,
}

/// Link between a customer and one of its departments
#[derive(Debug, Clone)]
pub struct CustomerDepartmentCreateDBRequest {
    pub customer_id: CustomerId,
    pub department_id: DepartmentId,
}

/// Re-points an existing customer/department link. `None` keeps the current side.
#[derive(Debug, Clone, Default)]
pub struct CustomerDepartmentUpdateDBRequest {
    pub customer_id: Option<CustomerId>,
    pub department_id: Option<DepartmentId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CustomerDepartmentDBResponse {
    pub id: CustomerDepartmentId,
    pub customer_id: CustomerId,
    pub department_id: DepartmentId,
}

/// Link between a department and an application it uses
#[derive(Debug, Clone)]
pub struct DepartmentApplicationCreateDBRequest {
    pub department_id: DepartmentId,
    pub application_id: ApplicationId,
}

/// Re-points an existing department/application link. `None` keeps the current side.
#[derive(Debug, Clone, Default)]
pub struct DepartmentApplicationUpdateDBRequest {
    pub department_id: Option<DepartmentId>,
    pub application_id: Option<ApplicationId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DepartmentApplicationDBResponse {
    pub id: DepartmentApplicationId,
    pub department_id: DepartmentId,
    pub application_id: ApplicationId,
}
