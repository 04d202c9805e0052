use serde::{Deserialize, Serialize};

/// A site or a room within a site.
///
/// Rooms carry the id of their site in `parent_id`; sites have none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Location {
    pub fn site(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
            kind: None,
        }
    }

    pub fn room(
        id: impl Into<String>,
        name: impl Into<String>,
        site_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: Some(site_id.into()),
            kind: None,
        }
    }

    pub fn is_site(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Resolves the site that owns `location_id`.
///
/// A room resolves to its parent; a site resolves to itself. Unknown ids
/// resolve to `None`.
pub fn site_of<'a>(location_id: &str, locations: &'a [Location]) -> Option<&'a str> {
    let location = locations.iter().find(|l| l.id == location_id)?;
    Some(location.parent_id.as_deref().unwrap_or(location.id.as_str()))
}
