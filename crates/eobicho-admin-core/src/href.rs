use url::Url;
use url::form_urlencoded;

/// Query marker appended to every iframe `src` so embedded pages can hide their own chrome.
pub const EMBEDDED_PARAM: &str = "embedded";
pub const EMBEDDED_VALUE: &str = "1";

pub const DEFAULT_TAB_PATH_PREFIXES: [&str; 2] = ["/pages/admin/", "/pages/funcionarios/"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HrefError {
    #[error("href must not be empty")]
    Empty,
    #[error("href could not be resolved: {0}")]
    Parse(#[from] url::ParseError),
}

/// An href resolved against the current location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHref {
    /// `path` or `path?query`, fragment and `embedded` removed. Used as the dedup key.
    pub key: String,
    /// Absolute form of the same destination.
    pub absolute: String,
    pub same_origin: bool,
}

impl ResolvedHref {
    pub fn path(&self) -> &str {
        self.key.split('?').next().unwrap_or_default()
    }

    /// Where a full browser navigation should go for this destination.
    pub fn navigation_target(&self) -> &str {
        if self.same_origin {
            &self.key
        } else {
            &self.absolute
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HrefResolver {
    base: Url,
    tab_path_prefixes: Vec<String>,
}

impl HrefResolver {
    pub fn new(base: &str, tab_path_prefixes: Vec<String>) -> Result<Self, HrefError> {
        let base = Url::parse(base)?;
        Ok(Self {
            base,
            tab_path_prefixes,
        })
    }

    pub fn with_default_prefixes(base: &str) -> Result<Self, HrefError> {
        Self::new(
            base,
            DEFAULT_TAB_PATH_PREFIXES
                .iter()
                .map(ToString::to_string)
                .collect(),
        )
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn tab_path_prefixes(&self) -> &[String] {
        &self.tab_path_prefixes
    }

    pub fn resolve(&self, raw: &str) -> Result<ResolvedHref, HrefError> {
        let url = self.join_without_marker(raw)?;
        let key = path_and_query(&url);
        let same_origin = url.origin() == self.base.origin();
        Ok(ResolvedHref {
            key,
            absolute: url.to_string(),
            same_origin,
        })
    }

    pub fn normalize(&self, raw: &str) -> Result<String, HrefError> {
        self.resolve(raw).map(|resolved| resolved.key)
    }

    pub fn iframe_src(&self, raw: &str) -> Result<String, HrefError> {
        let mut url = self.join_without_marker(raw)?;
        url.query_pairs_mut()
            .append_pair(EMBEDDED_PARAM, EMBEDDED_VALUE);
        Ok(path_and_query(&url))
    }

    pub fn is_tab_eligible(&self, resolved: &ResolvedHref) -> bool {
        resolved.same_origin && self.path_has_tab_prefix(resolved.path())
    }

    pub fn path_has_tab_prefix(&self, path: &str) -> bool {
        !path.is_empty()
            && self
                .tab_path_prefixes
                .iter()
                .any(|prefix| path.starts_with(prefix.as_str()))
    }

    fn join_without_marker(&self, raw: &str) -> Result<Url, HrefError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(HrefError::Empty);
        }
        let mut url = self.base.join(trimmed)?;
        url.set_fragment(None);

        let retained = url
            .query_pairs()
            .filter(|(name, _)| name != EMBEDDED_PARAM)
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect::<Vec<_>>();
        if retained.is_empty() {
            url.set_query(None);
        } else {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(retained.iter())
                .finish();
            url.set_query(Some(&query));
        }
        Ok(url)
    }
}

fn path_and_query(url: &Url) -> String {
    match url.query() {
        Some(query) if !query.is_empty() => format!("{}?{query}", url.path()),
        _ => url.path().to_string(),
    }
}

/// A click on an anchor, reduced to the fields the interception rules look at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkClick {
    pub button: i16,
    pub meta_key: bool,
    pub ctrl_key: bool,
    pub shift_key: bool,
    pub alt_key: bool,
    pub default_prevented: bool,
    pub target: Option<String>,
    pub has_download: bool,
    pub href: Option<String>,
}

impl LinkClick {
    pub fn left_click(href: &str) -> Self {
        Self {
            href: Some(href.to_string()),
            ..Self::default()
        }
    }

    /// Returns the raw href when the click should be routed into the tab shell.
    pub fn intercept(&self, resolver: &HrefResolver) -> Option<String> {
        if self.default_prevented || self.button != 0 {
            return None;
        }
        if self.meta_key || self.ctrl_key || self.shift_key || self.alt_key {
            return None;
        }
        if let Some(target) = self.target.as_deref() {
            let target = target.trim();
            if !target.is_empty() && target != "_self" {
                return None;
            }
        }
        if self.has_download {
            return None;
        }

        let href = self.href.as_deref()?.trim();
        if href.is_empty() || href == "#" || href.starts_with("mailto:") || href.starts_with("tel:")
        {
            return None;
        }

        let resolved = resolver.resolve(href).ok()?;
        if !resolver.is_tab_eligible(&resolved) {
            return None;
        }
        Some(href.to_string())
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `data-tab-label` wins over the anchor text when it has content.
pub fn resolve_link_label(data_tab_label: Option<&str>, text: &str) -> String {
    data_tab_label
        .map(collapse_whitespace)
        .filter(|label| !label.is_empty())
        .unwrap_or_else(|| collapse_whitespace(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> HrefResolver {
        HrefResolver::with_default_prefixes("https://loja.eobicho.com.br/pages/admin.html")
            .expect("base url parses")
    }

    #[test]
    fn normalize_strips_fragment_and_embedded_marker() {
        let resolver = resolver();
        assert_eq!(
            resolver
                .normalize("/pages/admin/produtos?embedded=1#topo")
                .expect("normalizes"),
            "/pages/admin/produtos"
        );
        assert_eq!(
            resolver
                .normalize("/pages/admin/produtos?page=2&embedded=1&q=ra%C3%A7%C3%A3o")
                .expect("normalizes"),
            "/pages/admin/produtos?page=2&q=ra%C3%A7%C3%A3o"
        );
    }

    #[test]
    fn normalize_resolves_relative_paths() {
        let resolver = resolver();
        assert_eq!(
            resolver.normalize("admin/servicos").expect("normalizes"),
            "/pages/admin/servicos"
        );
        assert_eq!(
            resolver.normalize("  ./admin/depositos  ").expect("normalizes"),
            "/pages/admin/depositos"
        );
    }

    #[test]
    fn normalize_rejects_blank_and_unparseable_hrefs() {
        let resolver = resolver();
        assert_eq!(resolver.normalize("   "), Err(HrefError::Empty));
        assert!(matches!(
            resolver.normalize("http://[::1"),
            Err(HrefError::Parse(_))
        ));
    }

    #[test]
    fn iframe_src_carries_exactly_one_embedded_marker() {
        let resolver = resolver();
        assert_eq!(
            resolver
                .iframe_src("/pages/admin/produtos?embedded=0&page=3#x")
                .expect("builds src"),
            "/pages/admin/produtos?page=3&embedded=1"
        );
        assert_eq!(
            resolver.iframe_src("/pages/admin/produtos").expect("builds src"),
            "/pages/admin/produtos?embedded=1"
        );
    }

    #[test]
    fn eligibility_requires_same_origin_and_prefix() {
        let resolver = resolver();
        let admin = resolver.resolve("/pages/admin/icms").expect("resolves");
        let staff = resolver.resolve("/pages/funcionarios/banho").expect("resolves");
        let public = resolver.resolve("/pages/produtos.html").expect("resolves");
        let foreign = resolver
            .resolve("https://example.org/pages/admin/icms")
            .expect("resolves");

        assert!(resolver.is_tab_eligible(&admin));
        assert!(resolver.is_tab_eligible(&staff));
        assert!(!resolver.is_tab_eligible(&public));
        assert!(!resolver.is_tab_eligible(&foreign));
        assert_eq!(
            foreign.navigation_target(),
            "https://example.org/pages/admin/icms"
        );
        assert_eq!(public.navigation_target(), "/pages/produtos.html");
    }

    #[test]
    fn intercept_accepts_plain_left_clicks_on_admin_links() {
        let resolver = resolver();
        let click = LinkClick::left_click("/pages/admin/produtos");
        assert_eq!(
            click.intercept(&resolver).as_deref(),
            Some("/pages/admin/produtos")
        );

        let self_target = LinkClick {
            target: Some("_self".to_string()),
            ..LinkClick::left_click("/pages/admin/produtos")
        };
        assert!(self_target.intercept(&resolver).is_some());
    }

    #[test]
    fn intercept_ignores_clicks_the_browser_should_handle() {
        let resolver = resolver();
        let base = LinkClick::left_click("/pages/admin/produtos");
        let rejected = [
            LinkClick {
                button: 1,
                ..base.clone()
            },
            LinkClick {
                ctrl_key: true,
                ..base.clone()
            },
            LinkClick {
                meta_key: true,
                ..base.clone()
            },
            LinkClick {
                default_prevented: true,
                ..base.clone()
            },
            LinkClick {
                target: Some("_blank".to_string()),
                ..base.clone()
            },
            LinkClick {
                has_download: true,
                ..base.clone()
            },
            LinkClick::left_click("#"),
            LinkClick::left_click("mailto:contato@eobicho.com.br"),
            LinkClick::left_click("tel:+5511999999999"),
            LinkClick::left_click("/pages/carrinho.html"),
            LinkClick {
                href: None,
                ..base
            },
        ];
        for click in rejected {
            assert_eq!(click.intercept(&resolver), None, "{click:?}");
        }
    }

    #[test]
    fn link_label_prefers_data_attribute() {
        assert_eq!(
            resolve_link_label(Some("  Regras  ICMS "), "ignored"),
            "Regras ICMS"
        );
        assert_eq!(resolve_link_label(Some("   "), "\n  Produtos \t"), "Produtos");
        assert_eq!(resolve_link_label(None, "Contas  a pagar"), "Contas a pagar");
    }
}
