//! Paged catalog loading.

use std::collections::HashSet;

use tracing::debug;

use bestfit_core::{CatalogProvider, InstanceTypeSpec};

use crate::error::{CatalogError, CatalogResult};

/// Fetch every page of `region`'s catalog.
pub async fn load_catalog(
    provider: &dyn CatalogProvider,
    region: &str,
) -> CatalogResult<Vec<InstanceTypeSpec>> {
    let mut instance_types = Vec::new();
    let mut seen_tokens = HashSet::new();
    let mut token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = provider.list_instance_types(region, token.as_deref()).await?;
        pages += 1;
        instance_types.extend(page.instance_types);

        match page.next_token {
            Some(next) => {
                if !seen_tokens.insert(next.clone()) {
                    return Err(CatalogError::RepeatedPageToken(next));
                }
                token = Some(next);
            }
            None => break,
        }
    }

    debug!(%region, pages, instance_types = instance_types.len(), "catalog loaded");
    Ok(instance_types)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bestfit_core::{Architecture, CatalogPage, ProviderError, ProviderResult, UsageClass};

    fn spec(name: &str) -> InstanceTypeSpec {
        InstanceTypeSpec {
            instance_type: name.to_string(),
            vcpu: 2.0,
            memory_gb: 4.0,
            architectures: BTreeSet::from([Architecture::X86_64]),
            usage_classes_supported: BTreeSet::from([UsageClass::OnDemand]),
            is_burstable: false,
            is_current_generation: true,
            instance_storage_supported: false,
            supported_zones: BTreeSet::new(),
        }
    }

    /// Serves pages keyed by the token that requests them.
    struct PagedCatalog {
        pages: Vec<(Option<&'static str>, Vec<&'static str>, Option<&'static str>)>,
        requests: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl CatalogProvider for PagedCatalog {
        async fn list_instance_types(
            &self,
            region: &str,
            page_token: Option<&str>,
        ) -> ProviderResult<CatalogPage> {
            if region != "us-east-1" {
                return Err(ProviderError::InvalidRegion(region.to_string()));
            }
            self.requests.lock().unwrap().push(page_token.map(str::to_string));
            let (_, names, next) = self
                .pages
                .iter()
                .find(|(token, _, _)| *token == page_token)
                .expect("unexpected page token");
            Ok(CatalogPage {
                instance_types: names.iter().map(|n| spec(n)).collect(),
                next_token: next.map(str::to_string),
            })
        }
    }

    #[tokio::test]
    async fn follows_every_page() {
        let provider = PagedCatalog {
            pages: vec![
                (None, vec!["m5.large", "m5.xlarge"], Some("p2")),
                (Some("p2"), vec!["c5.large"], Some("p3")),
                (Some("p3"), vec!["r5.large"], None),
            ],
            requests: Mutex::new(Vec::new()),
        };

        let catalog = load_catalog(&provider, "us-east-1").await.unwrap();

        let names: Vec<_> = catalog.iter().map(|s| s.instance_type.as_str()).collect();
        assert_eq!(names, vec!["m5.large", "m5.xlarge", "c5.large", "r5.large"]);
        assert_eq!(provider.requests.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn repeated_token_is_an_error() {
        let provider = PagedCatalog {
            pages: vec![
                (None, vec!["m5.large"], Some("again")),
                (Some("again"), vec!["c5.large"], Some("again")),
            ],
            requests: Mutex::new(Vec::new()),
        };

        let err = load_catalog(&provider, "us-east-1").await.unwrap_err();
        assert!(matches!(err, CatalogError::RepeatedPageToken(t) if t == "again"));
    }

    #[tokio::test]
    async fn provider_errors_propagate() {
        let provider = PagedCatalog {
            pages: Vec::new(),
            requests: Mutex::new(Vec::new()),
        };

        let err = load_catalog(&provider, "mars-1").await.unwrap_err();
        assert!(matches!(err, CatalogError::Provider(ProviderError::InvalidRegion(_))));
    }
}
