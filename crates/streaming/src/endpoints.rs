/// URL layout of the computation server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new("")
    }
}

impl Endpoints {
    /// `base` is the server root without trailing slash; empty for same-origin.
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn module(&self, id: &str) -> String {
        format!("{}/progressivis/module/get/{}", self.base, id)
    }

    pub fn scheduler(&self) -> String {
        format!("{}/progressivis/scheduler/?short=False", self.base)
    }

    /// `path` is `<module>` or `<module>/<slot>/<parameter>`.
    pub fn input(&self, path: &str) -> String {
        format!("{}/progressivis/module/input/{}", self.base, path)
    }

    /// Resolves a server-relative raster reference against the base.
    pub fn resolve(&self, href: &str) -> String {
        if href.starts_with('/') {
            format!("{}{}", self.base, href)
        } else {
            href.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Endpoints;

    #[test]
    fn builds_urls() {
        let e = Endpoints::new("http://localhost:5000/");
        assert_eq!(e.module("sp"), "http://localhost:5000/progressivis/module/get/sp");
        assert_eq!(
            e.scheduler(),
            "http://localhost:5000/progressivis/scheduler/?short=False"
        );
        assert_eq!(
            e.input("sp/range_query/min_value"),
            "http://localhost:5000/progressivis/module/input/sp/range_query/min_value"
        );
    }

    #[test]
    fn resolves_relative_images_only() {
        let e = Endpoints::new("http://h");
        assert_eq!(e.resolve("/img?run_number=1"), "http://h/img?run_number=1");
        assert_eq!(e.resolve("data:image/png;base64,AA"), "data:image/png;base64,AA");
        assert_eq!(Endpoints::default().resolve("/img"), "/img");
    }
}
