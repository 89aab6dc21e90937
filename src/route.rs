// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{borrow::Cow, collections::BTreeMap, fmt};

use log::{error, trace};

const MAX_REDIRECTS: usize = 8;

/// Whether a route is open to anyone, and which role it demands otherwise.
/// The default is the conservative one: protected, with no role.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct RouteDeclaration {
    pub(crate) public: bool,
    pub(crate) required_role: Option<String>,
}

impl RouteDeclaration {
    #[cfg(test)]
    pub(crate) fn public() -> Self {
        Self {
            public: true,
            required_role: None,
        }
    }

    pub(crate) fn protected() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn for_role(role: &str) -> Self {
        Self {
            public: false,
            required_role: Some(role.to_owned()),
        }
    }
}

// Absent keys are inherited from the enclosing route.
#[derive(Clone, Debug, Default)]
struct Meta {
    public: Option<bool>,
    role: Option<String>,
}

impl Meta {
    fn merged_over(&self, parent: &Self) -> Self {
        Self {
            public: self.public.or(parent.public),
            role: self.role.clone().or_else(|| parent.role.clone()),
        }
    }
}

impl From<&Meta> for RouteDeclaration {
    fn from(value: &Meta) -> Self {
        Self {
            public: value.public.unwrap_or(false),
            required_role: value.role.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Redirect {
    Path(String),
    Name(String),
}

impl fmt::Display for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.write_str(path),
            Self::Name(name) => write!(f, "{name} (by name)"),
        }
    }
}

/// A node of a route table as it is declared.
#[derive(Clone, Debug)]
pub(crate) struct Route {
    path: String,
    name: Option<String>,
    meta: Meta,
    redirect: Option<Redirect>,
    children: Vec<Route>,
}

impl Route {
    pub(crate) fn new(path: &str) -> Self {
        Self {
            path: path.to_owned(),
            name: None,
            meta: Meta::default(),
            redirect: None,
            children: vec![],
        }
    }

    pub(crate) fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        self
    }

    pub(crate) fn public(mut self) -> Self {
        self.meta.public = Some(true);
        self
    }

    #[cfg(test)]
    pub(crate) fn role(mut self, role: &str) -> Self {
        self.meta.role = Some(role.to_owned());
        self
    }

    pub(crate) fn redirect_to(mut self, path: &str) -> Self {
        self.redirect = Some(Redirect::Path(path.to_owned()));
        self
    }

    pub(crate) fn redirect_to_name(mut self, name: &str) -> Self {
        self.redirect = Some(Redirect::Name(name.to_owned()));
        self
    }

    pub(crate) fn children(mut self, children: Vec<Self>) -> Self {
        self.children = children;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
}

impl Segment {
    fn rank(&self) -> u8 {
        match self {
            Self::Static(_) => 2,
            Self::Param(_) => 1,
        }
    }
}

fn decode(segment: &str) -> Cow<'_, str> {
    urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment))
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

fn join(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        return child.to_owned();
    }
    let mut joined = parent.trim_end_matches('/').to_owned();
    if !child.is_empty() {
        joined.push('/');
        joined.push_str(child);
    }
    if joined.is_empty() {
        joined.push('/');
    }
    joined
}

/// A flattened route: its full pattern and the metadata it ends up with once
/// every enclosing route's metadata has been merged in.
#[derive(Clone, Debug)]
pub(crate) struct Record {
    pattern: String,
    segments: Vec<Segment>,
    name: Option<String>,
    declaration: RouteDeclaration,
    redirect: Option<Redirect>,
}

impl Record {
    pub(crate) fn pattern(&self) -> &str {
        &self.pattern
    }

    pub(crate) fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) const fn declaration(&self) -> &RouteDeclaration {
        &self.declaration
    }

    pub(crate) const fn redirect(&self) -> Option<&Redirect> {
        self.redirect.as_ref()
    }

    fn matches(&self, segments: &[String]) -> Option<BTreeMap<String, String>> {
        if segments.len() != self.segments.len() {
            return None;
        }
        let mut params = BTreeMap::new();
        for (expected, actual) in self.segments.iter().zip(segments) {
            match expected {
                Segment::Static(s) if *s == actual.to_lowercase() => {}
                Segment::Static(_) => return None,
                Segment::Param(name) => {
                    _ = params.insert(name.clone(), actual.clone());
                }
            }
        }
        Some(params)
    }

    /// Fills the record's parameters in from `params`, if all are available.
    fn build(&self, params: &BTreeMap<String, String>) -> Option<String> {
        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Static(s) => path.push_str(s),
                Segment::Param(name) => path.push_str(params.get(name)?),
            }
        }
        if path.is_empty() {
            path.push('/');
        }
        Some(path)
    }
}

/// Where a path ended up after matching and following redirects.
#[derive(Clone, Debug)]
pub(crate) struct Resolution<'router> {
    path: String,
    record: Option<&'router Record>,
    params: BTreeMap<String, String>,
}

impl Resolution<'_> {
    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn name(&self) -> Option<&str> {
        self.record.and_then(Record::name)
    }

    pub(crate) const fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// The declaration to authorize against. Unmatched paths are protected.
    pub(crate) fn declaration(&self) -> Cow<'_, RouteDeclaration> {
        self.record.map_or_else(
            || Cow::Owned(RouteDeclaration::protected()),
            |record| Cow::Borrowed(record.declaration()),
        )
    }

    pub(crate) fn into_params(self) -> BTreeMap<String, String> {
        self.params
    }
}

pub(crate) struct Router {
    records: Vec<Record>,
}

impl Router {
    pub(crate) fn new(routes: Vec<Route>) -> Self {
        fn flatten(route: Route, parent_pattern: &str, parent_meta: &Meta, out: &mut Vec<Record>) {
            let pattern = join(parent_pattern, &route.path);
            let meta = route.meta.merged_over(parent_meta);
            for child in route.children {
                flatten(child, &pattern, &meta, out);
            }
            out.push(Record {
                segments: split(&pattern)
                    .map(|segment| match segment.strip_prefix(':') {
                        Some(name) => Segment::Param(name.to_owned()),
                        None => Segment::Static(decode(segment).to_lowercase()),
                    })
                    .collect(),
                pattern,
                name: route.name,
                declaration: RouteDeclaration::from(&meta),
                redirect: route.redirect,
            });
        }

        let mut records = vec![];
        for route in routes {
            flatten(route, "", &Meta::default(), &mut records);
        }
        Self { records }
    }

    pub(crate) fn records(&self) -> &[Record] {
        &self.records
    }

    pub(crate) fn by_name(&self, name: &str) -> Option<&Record> {
        self.records
            .iter()
            .find(|record| record.name.as_deref() == Some(name))
    }

    /// Matches a path against the table without following redirects. Static
    /// segments win over parameters; ties go to the earliest record.
    pub(crate) fn matching(&self, path: &str) -> Resolution<'_> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<String> = split(path).map(|s| decode(s).into_owned()).collect();

        let mut best: Option<(Vec<u8>, &Record, BTreeMap<String, String>)> = None;
        for record in &self.records {
            if let Some(params) = record.matches(&segments) {
                let rank: Vec<u8> = record.segments.iter().map(Segment::rank).collect();
                if best.as_ref().map_or(true, |(best_rank, ..)| rank > *best_rank) {
                    best = Some((rank, record, params));
                }
            }
        }

        let normalized = format!("/{}", segments.join("/"));
        match best {
            Some((_, record, params)) => Resolution {
                path: normalized,
                record: Some(record),
                params,
            },
            None => Resolution {
                path: normalized,
                record: None,
                params: BTreeMap::new(),
            },
        }
    }

    /// Matches a path and follows any redirects the matched routes declare.
    pub(crate) fn resolve(&self, path: &str) -> Resolution<'_> {
        let mut resolution = self.matching(path);
        for _ in 0..MAX_REDIRECTS {
            let Some(redirect) = resolution.record.and_then(Record::redirect) else {
                return resolution;
            };
            let target = match redirect {
                Redirect::Path(target) => Some(join("/", target)),
                Redirect::Name(name) => self
                    .by_name(name)
                    .and_then(|record| record.build(resolution.params())),
            };
            match target {
                Some(target) => {
                    trace!("Following redirect from {} to {}", resolution.path, target);
                    resolution = self.matching(&target);
                }
                None => {
                    error!(
                        "Route {} redirects to {}, which cannot be resolved",
                        resolution.path, redirect
                    );
                    return Resolution {
                        path: resolution.path,
                        record: None,
                        params: BTreeMap::new(),
                    };
                }
            }
        }

        error!("Too many redirects while resolving {}", path);
        Resolution {
            path: resolution.path,
            record: None,
            params: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> Router {
        Router::new(vec![
            Route::new("/").named("Home").public(),
            Route::new("/login").named("Login").public(),
            Route::new("/teachers").named("TeacherPortal").role("teacher").children(vec![
                Route::new("").named("TeachersDashboard"),
                Route::new("student/:id").named("StudentsDetail"),
                Route::new("students/new").named("NewStudent"),
                Route::new("virtual lab").named("Lab"),
                Route::new("/assignments/:assignmentId/students/:studentId")
                    .named("StudentAssignmentResponse"),
                Route::new("help").named("Help").public(),
            ]),
            Route::new("/parent").role("parent").children(vec![
                Route::new("finance")
                    .named("ParentFinance")
                    .redirect_to_name("ParentFeeSummary")
                    .children(vec![Route::new("overview").named("ParentFeeSummary")]),
            ]),
            Route::new("/old").redirect_to("/login"),
            Route::new("/loop-a").redirect_to("/loop-b"),
            Route::new("/loop-b").redirect_to("/loop-a"),
        ])
    }

    #[test]
    fn index_child_wins_over_its_parent() {
        let router = router();
        let resolution = router.resolve("/teachers/");
        assert_eq!(resolution.name(), Some("TeachersDashboard"));
        assert_eq!(
            *resolution.declaration(),
            RouteDeclaration::for_role("teacher")
        );
    }

    #[test]
    fn children_inherit_and_override_metadata() {
        let router = router();
        assert_eq!(
            *router.resolve("/teachers/help").declaration(),
            RouteDeclaration {
                public: true,
                required_role: Some("teacher".to_owned()),
            }
        );
        // Absolute child paths still sit under their parent.
        let resolution = router.resolve("/assignments/4/students/9");
        assert_eq!(resolution.name(), Some("StudentAssignmentResponse"));
        assert_eq!(
            resolution.declaration().required_role.as_deref(),
            Some("teacher")
        );
        assert_eq!(resolution.params().get("assignmentId").map(String::as_str), Some("4"));
        assert_eq!(resolution.params().get("studentId").map(String::as_str), Some("9"));
    }

    #[test]
    fn params_query_and_encoding() {
        let router = router();
        let resolution = router.resolve("/Teachers/student/Ada?tab=grades#top");
        assert_eq!(resolution.name(), Some("StudentsDetail"));
        assert_eq!(resolution.path(), "/Teachers/student/Ada");
        assert_eq!(resolution.into_params().get("id").map(String::as_str), Some("Ada"));

        assert_eq!(router.resolve("/teachers/virtual%20lab").name(), Some("Lab"));
    }

    #[test]
    fn static_segments_beat_params() {
        let router = Router::new(vec![
            Route::new("/events/:id").named("EventDetail"),
            Route::new("/events/create").named("EventCreate"),
        ]);
        assert_eq!(router.resolve("/events/create").name(), Some("EventCreate"));
        assert_eq!(router.resolve("/events/12").name(), Some("EventDetail"));
    }

    #[test]
    fn unmatched_paths_are_protected() {
        let router = router();
        let resolution = router.resolve("/nowhere");
        assert_eq!(resolution.name(), None);
        assert_eq!(*resolution.declaration(), RouteDeclaration::protected());
    }

    #[test]
    fn redirects_are_followed() {
        let router = router();
        assert_eq!(router.resolve("/old").name(), Some("Login"));
        let resolution = router.resolve("/parent/finance");
        assert_eq!(resolution.name(), Some("ParentFeeSummary"));
        assert_eq!(resolution.path(), "/parent/finance/overview");
    }

    #[test]
    fn redirect_loops_end_unmatched() {
        let router = router();
        let resolution = router.resolve("/loop-a");
        assert_eq!(resolution.name(), None);
        assert!(!resolution.declaration().public);
    }
}
