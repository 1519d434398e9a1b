//! Customer identities and canned prompt templates.
//!
//! Both are static data supplied by the embedding application as JSON
//! documents (`{"customers": [...]}` and `{"prompts": [...]}`).  The
//! conversation core only ever reads `customer_id` and `auth_token_b64`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Customer identity
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    /// Pre-encoded credential sent as `Authorization: Basic <token>`.
    #[serde(default)]
    pub auth_token_b64: Option<String>,
    pub name: String,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub ssn_simulated: Option<String>,
    #[serde(default)]
    pub account: Option<CustomerAccount>,
    #[serde(default)]
    pub contact: Option<CustomerContact>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerAccount {
    pub account_id: String,
    #[serde(default)]
    pub routing_number: Option<String>,
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerContact {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub tx_id: String,
    pub date: String,
    pub amount: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub counterparty: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Prompt templates
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub id: String,
    pub label: String,
    pub prompt: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Catalog
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
struct CustomersDoc {
    #[serde(default)]
    customers: Vec<Customer>,
}

#[derive(Debug, Deserialize)]
struct PromptsDoc {
    #[serde(default)]
    prompts: Vec<PromptTemplate>,
}

/// The customers and prompt templates offered to the operator.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub customers: Vec<Customer>,
    pub prompts: Vec<PromptTemplate>,
}

impl Catalog {
    /// Load both documents.  A missing file yields an empty list; a file
    /// that exists but does not parse is a configuration error.
    pub fn load(customers_path: &Path, prompts_path: &Path) -> Result<Self> {
        let customers = match read_optional(customers_path)? {
            Some(raw) => {
                serde_json::from_str::<CustomersDoc>(&raw)
                    .map_err(|e| {
                        Error::Config(format!("parsing {}: {e}", customers_path.display()))
                    })?
                    .customers
            }
            None => Vec::new(),
        };

        let prompts = match read_optional(prompts_path)? {
            Some(raw) => {
                serde_json::from_str::<PromptsDoc>(&raw)
                    .map_err(|e| {
                        Error::Config(format!("parsing {}: {e}", prompts_path.display()))
                    })?
                    .prompts
            }
            None => Vec::new(),
        };

        tracing::debug!(
            customers = customers.len(),
            prompts = prompts.len(),
            "catalog loaded"
        );

        Ok(Self { customers, prompts })
    }

    pub fn customer(&self, customer_id: &str) -> Option<&Customer> {
        self.customers.iter().find(|c| c.customer_id == customer_id)
    }

    pub fn prompt(&self, id: &str) -> Option<&PromptTemplate> {
        self.prompts.iter().find(|p| p.id == id)
    }

    /// The customer to act as: the stored choice when it is still in the
    /// catalog, otherwise the first customer listed.
    pub fn effective_customer(&self, stored: Option<&str>) -> Option<&Customer> {
        stored
            .and_then(|id| self.customer(id))
            .or_else(|| self.customers.first())
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "catalog file not found, using empty list");
        return Ok(None);
    }
    Ok(Some(std::fs::read_to_string(path)?))
}
