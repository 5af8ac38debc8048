use crate::models::{Title, TitleKind};

/// Ratings excluded for viewers under 18
pub const MATURE_RATINGS: [&str; 3] = ["R", "NC-17", "TV-MA"];

/// Allow-list of child-appropriate ratings used by kids mode
pub const KID_RATINGS: [&str; 7] = ["G", "TV-G", "TV-Y", "TV-Y7", "TV-Y7-FV", "PG", "TV-PG"];

const ADULT_AGE: i32 = 18;

/// Composed store query predicate
///
/// Built from mixed filter criteria and passed opaquely to a store backend.
/// All conditions are conjunctive; `genres_any` is internally a disjunction
/// of substring matches against the comma-joined genre field. Age restriction
/// and kids mode are independent conditions and both apply when both are
/// requested, so the combined filter is the more restrictive of the two.
///
/// An empty predicate matches every title.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitlePredicate {
    pub kind: Option<TitleKind>,
    /// Case-insensitive substring matched against name, cast, or director
    pub search: Option<String>,
    /// Case-insensitive substring matches against the genre field, OR-ed.
    /// Substring rather than exact membership: the field is unstructured text.
    pub genres_any: Vec<String>,
    /// Exclude titles rated in `MATURE_RATINGS`; unrated titles pass
    pub exclude_mature: bool,
    /// Keep only titles rated in `KID_RATINGS`; unrated titles are dropped
    pub kids_only: bool,
}

impl TitlePredicate {
    /// Predicate for the browse/search listing
    pub fn browse(
        kind: Option<TitleKind>,
        search: Option<&str>,
        genre: Option<&str>,
        viewer_age: Option<i32>,
        kids_mode: bool,
    ) -> Self {
        Self {
            kind,
            search: non_blank(search),
            genres_any: non_blank(genre).into_iter().collect(),
            exclude_mature: is_minor(viewer_age),
            kids_only: kids_mode,
        }
    }

    /// Predicate matching titles that overlap any of the given genre tags
    pub fn genre_overlap(genres: &[String], viewer_age: Option<i32>) -> Self {
        Self {
            genres_any: genres.to_vec(),
            exclude_mature: is_minor(viewer_age),
            ..Self::default()
        }
    }

    /// Unconditioned predicate, restricted only by viewer age
    pub fn unrestricted(viewer_age: Option<i32>) -> Self {
        Self {
            exclude_mature: is_minor(viewer_age),
            ..Self::default()
        }
    }

    /// Evaluates the predicate against one title.
    ///
    /// This is the semantic definition of the filter; store backends that do
    /// not compile predicates into their own query language (e.g. in-memory
    /// stores) evaluate titles with it directly.
    pub fn matches(&self, title: &Title) -> bool {
        if let Some(kind) = self.kind {
            if title.kind != kind {
                return false;
            }
        }

        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let hit = [
                Some(title.name.as_str()),
                title.cast.as_deref(),
                title.director.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }

        if !self.genres_any.is_empty() {
            let listed = title
                .listed_in
                .as_deref()
                .unwrap_or_default()
                .to_lowercase();
            let hit = self
                .genres_any
                .iter()
                .any(|genre| listed.contains(&genre.to_lowercase()));
            if !hit {
                return false;
            }
        }

        let rating = title.rating.as_deref();

        if self.exclude_mature && rating.is_some_and(|r| MATURE_RATINGS.contains(&r)) {
            return false;
        }

        if self.kids_only && !rating.is_some_and(|r| KID_RATINGS.contains(&r)) {
            return false;
        }

        true
    }
}

fn is_minor(age: Option<i32>) -> bool {
    matches!(age, Some(age) if age < ADULT_AGE)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
