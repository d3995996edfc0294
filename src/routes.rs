#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    BlogList,
    BlogPost { slug: String },
    Habit { name: String },
    Static { path: String },
}

impl Route {
    /// Parses an in-app path. Query strings, fragments and trailing slashes
    /// are ignored; each segment is percent-decoded.
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_matches('/');
        let segments = trimmed
            .split('/')
            .filter(|s| !s.is_empty())
            .map(decode_segment)
            .collect::<Vec<_>>();

        let parts = segments.iter().map(String::as_str).collect::<Vec<_>>();

        match parts.as_slice() {
            [] => Self::Home,
            ["blog"] => Self::BlogList,
            ["blog", slug] => Self::BlogPost {
                slug: (*slug).to_owned(),
            },
            ["habits", name] => Self::Habit {
                name: (*name).to_owned(),
            },
            _ => Self::Static {
                path: format!("/{}", segments.join("/")),
            },
        }
    }

    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_owned(),
            Self::BlogList => "/blog".to_owned(),
            Self::BlogPost { slug } => format!("/blog/{slug}"),
            Self::Habit { name } => format!("/habits/{name}"),
            Self::Static { path } => path.clone(),
        }
    }

    pub fn is_article(&self) -> bool {
        matches!(self, Self::BlogPost { .. })
    }
}

fn decode_segment(segment: &str) -> String {
    match urlencoding::decode(segment) {
        Ok(decoded) => decoded.into_owned(),
        Err(err) => {
            tracing::debug!(segment, error = %err, "undecodable path segment kept raw");
            segment.to_owned()
        }
    }
}
