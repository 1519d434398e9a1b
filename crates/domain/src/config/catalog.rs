use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Customer / prompt catalog
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "d_customers")]
    pub customers_path: PathBuf,
    #[serde(default = "d_prompts")]
    pub prompts_path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            customers_path: d_customers(),
            prompts_path: d_prompts(),
        }
    }
}

fn d_customers() -> PathBuf {
    PathBuf::from("data/customers.json")
}
fn d_prompts() -> PathBuf {
    PathBuf::from("data/prompts.json")
}
