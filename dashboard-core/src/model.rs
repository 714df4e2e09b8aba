use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub deployment_url: Option<String>,
    #[serde(default)]
    pub health_check_url: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrdType {
    Platform,
    Agent,
}

impl PrdType {
    pub fn as_str(self) -> &'static str {
        match self {
            PrdType::Platform => "platform",
            PrdType::Agent => "agent",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prd {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_prd_type")]
    pub prd_type: Option<PrdType>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Unknown type tags are dropped rather than failing the whole collection.
fn lenient_prd_type<'de, D>(deserializer: D) -> Result<Option<PrdType>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw.as_deref() {
        Some("platform") => Some(PrdType::Platform),
        Some("agent") => Some(PrdType::Agent),
        _ => None,
    })
}

/// Which of the two dashboard collections a value refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Agents,
    Prds,
}

impl Collection {
    pub fn label(self) -> &'static str {
        match self {
            Collection::Agents => "Agents",
            Collection::Prds => "PRDs",
        }
    }

    pub fn noun(self) -> &'static str {
        match self {
            Collection::Agents => "agents",
            Collection::Prds => "PRDs",
        }
    }
}
