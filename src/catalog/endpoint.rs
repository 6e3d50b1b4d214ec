use super::AssetKind;

/// Catalog REST endpoints. Builds paths only; issuing the request is the
/// client's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEndpoint {
    Types,
    Assets {
        kind: Option<AssetKind>,
        categories: Vec<String>,
    },
    Info(String),
    Files(String),
    Author(String),
    Categories {
        kind: AssetKind,
        filter_in: Vec<String>,
    },
}

impl CatalogEndpoint {
    pub fn path(&self) -> String {
        match self {
            Self::Types => "/types".to_string(),
            Self::Assets { kind, categories } => {
                let mut params = Vec::new();
                if let Some(kind) = kind {
                    params.push(("type", kind.catalog_type().to_string()));
                }
                if !categories.is_empty() {
                    params.push(("categories", categories.join(",")));
                }
                with_query("/assets".to_string(), &params)
            }
            Self::Info(id) => format!("/info/{}", urlencoding::encode(id)),
            Self::Files(id) => format!("/files/{}", urlencoding::encode(id)),
            Self::Author(id) => format!("/author/{}", urlencoding::encode(id)),
            Self::Categories { kind, filter_in } => {
                let mut params = Vec::new();
                if !filter_in.is_empty() {
                    params.push(("in", filter_in.join(",")));
                }
                with_query(format!("/categories/{}", kind.catalog_type()), &params)
            }
        }
    }

    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path())
    }

    pub fn request(&self, base_url: &str, user_agent: &str) -> CatalogRequest {
        CatalogRequest {
            url: self.url(base_url),
            user_agent: user_agent.to_string(),
        }
    }
}

/// One GET against the catalog, ready for the HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRequest {
    pub url: String,
    pub user_agent: String,
}

fn with_query(path: String, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return path;
    }
    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", path, query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_listing_query() {
        let endpoint = CatalogEndpoint::Assets {
            kind: Some(AssetKind::TextureSet),
            categories: vec!["outdoor".to_string(), "brick".to_string()],
        };
        assert_eq!(endpoint.path(), "/assets?type=textures&categories=outdoor%2Cbrick");

        let bare = CatalogEndpoint::Assets {
            kind: None,
            categories: Vec::new(),
        };
        assert_eq!(bare.path(), "/assets");
    }

    #[test]
    fn id_paths_are_encoded() {
        assert_eq!(CatalogEndpoint::Files("rock 01".to_string()).path(), "/files/rock%2001");
        assert_eq!(
            CatalogEndpoint::Info("abandoned_greenhouse".to_string())
                .url("https://api.polyhaven.com/"),
            "https://api.polyhaven.com/info/abandoned_greenhouse"
        );
        assert_eq!(
            CatalogEndpoint::Categories {
                kind: AssetKind::Environment,
                filter_in: Vec::new(),
            }
            .path(),
            "/categories/hdris"
        );
    }
}
